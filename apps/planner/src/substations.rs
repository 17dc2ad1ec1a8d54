use shared::domain::Substation;

const DEHRADUN: [(&str, f64, f64); 30] = [
    ("Dakpatti", 30.3572, 78.0789),
    ("Anarwala", 30.3527, 78.0703),
    ("Hathibarkala", 30.3520, 78.0534),
    ("Sahastradhara", 30.3285, 78.0828),
    ("Landour", 30.3037, 78.0710),
    ("Kyarkulli", 30.3102, 78.0598),
    ("Kunj Bhawan", 30.3241, 78.0426),
    ("LBS Mussorie", 30.4525, 78.0665),
    ("Kargi", 30.2999, 78.0211),
    ("Turner Road", 30.3214, 78.0547),
    ("Kaulagarh", 30.3258, 78.0313),
    ("Vasant Vihar", 30.3040, 78.0447),
    ("Niranjanpur", 30.2842, 78.0518),
    ("Parade Ground", 30.3174, 78.0322),
    ("Bindal", 30.3360, 78.0355),
    ("Govindgarh", 30.3235, 78.0359),
    ("Patel Road", 30.3158, 78.0324),
    ("Nehru Colony", 30.3191, 78.0389),
    ("Doordarshan Kendra", 30.3247, 78.0410),
    ("EC Road", 30.3252, 78.0295),
    ("Raipur", 30.3020, 78.0472),
    ("Ajabpur", 30.1740, 78.0500),
    ("Miyawala", 30.1620, 78.0480),
    ("Ring Road Raipur", 30.3005, 78.0475),
    ("Chalang", 30.2930, 78.0420),
    ("Selaqui", 30.2320, 78.0980),
    ("Pharma City", 30.2280, 78.0930),
    ("Mohanpur", 30.2340, 78.1120),
    ("Ganeshpur", 30.2400, 78.1180),
    ("Jhajhra", 30.2800, 78.1150),
];

/// Distribution substations around Dehradun.
pub fn dehradun() -> Vec<Substation> {
    DEHRADUN
        .iter()
        .map(|(name, lat, lng)| Substation::new(*name, *lat, *lng))
        .collect()
}
