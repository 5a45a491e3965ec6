/// Documents every corpus starts with.
pub const SEED_DOCUMENTS: &[&str] = &[
    "Employees are entitled to 20 days of paid leave per year.",
    "Office working hours are from 9 AM to 6 PM, Monday to Friday.",
    "Remote work is allowed with prior manager approval.",
    "The company conducts annual performance reviews every December.",
    "Grievances can be submitted via the HR portal or by contacting HR directly.",
    "IT policies prohibit installing unauthorized software.",
    "Employees must report unsafe conditions to the safety officer.",
];
