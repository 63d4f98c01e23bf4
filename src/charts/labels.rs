//! Display names for coded columns

const GENDER: &[(i64, &str)] = &[(0, "0 - Male (Hombre)"), (1, "1 - Female (Mujer)")];

const PARENTAL_EDUCATION: &[(i64, &str)] = &[
    (0, "0 - None"),
    (1, "1 - High School"),
    (2, "2 - Some College"),
    (3, "3 - Bachelor's"),
    (4, "4 - Higher"),
];

fn table_for(column: &str) -> Option<&'static [(i64, &'static str)]> {
    match column {
        "Gender" => Some(GENDER),
        "ParentalEducation" => Some(PARENTAL_EDUCATION),
        _ => None,
    }
}

/// Label for `value` in `column`; unmapped values print as themselves
pub fn display_label(column: &str, value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        let code = value as i64;
        if let Some(label) = table_for(column)
            .and_then(|table| table.iter().find(|(c, _)| *c == code))
            .map(|(_, label)| *label)
        {
            return label.to_string();
        }
        return code.to_string();
    }
    value.to_string()
}
