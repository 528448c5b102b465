//! The seventeen UN Sustainable Development Goals.
//!
//! Goals are identified by their number (1–17) everywhere in the crate; this
//! module maps numbers to display labels and to the base query used when
//! searching PubMed Central for open-access papers about a goal.

/// Lowest valid goal number.
pub const MIN_SDG: u8 = 1;
/// Highest valid goal number.
pub const MAX_SDG: u8 = 17;

const LABELS: [&str; 17] = [
    "No Poverty",
    "Zero Hunger",
    "Good Health & Well-Being",
    "Quality Education",
    "Gender Equality",
    "Clean Water & Sanitation",
    "Affordable & Clean Energy",
    "Decent Work & Economic Growth",
    "Industry, Innovation & Infrastructure",
    "Reduced Inequalities",
    "Sustainable Cities & Communities",
    "Responsible Consumption & Production",
    "Climate Action",
    "Life Below Water",
    "Life on Land",
    "Peace, Justice & Strong Institutions",
    "Partnerships for the Goals",
];

const SEARCH_QUERIES: [&str; 17] = [
    r#"(poverty OR "low income" OR "social protection")"#,
    r#"(hunger OR malnutrition OR "food security" OR "sustainable agriculture")"#,
    r#"("public health" OR "global health" OR "maternal health" OR "infectious disease")"#,
    r#"(education OR literacy OR "learning outcomes")"#,
    r#"("gender equality" OR "women's empowerment" OR "gender-based violence")"#,
    r#"("clean water" OR sanitation OR hygiene OR "drinking water")"#,
    r#"("renewable energy" OR "energy access" OR "clean energy")"#,
    r#"(employment OR "decent work" OR "occupational health" OR "economic growth")"#,
    r#"(infrastructure OR industrialization OR "health technology" OR innovation)"#,
    r#"(inequality OR "health disparities" OR migration OR discrimination)"#,
    r#"(urban OR "air pollution" OR housing OR "sustainable cities")"#,
    r#"("sustainable consumption" OR "waste management" OR recycling OR "food waste")"#,
    r#"("climate change" OR "global warming" OR "greenhouse gas" OR "heat stress")"#,
    r#"("marine ecosystem" OR ocean OR fisheries OR "coral reef")"#,
    r#"(biodiversity OR deforestation OR "land degradation" OR "terrestrial ecosystem")"#,
    r#"(violence OR justice OR corruption OR "armed conflict")"#,
    r#"("global partnership" OR "international cooperation" OR "development assistance")"#,
];

/// True when `n` names one of the seventeen goals.
pub fn is_valid(n: i64) -> bool {
    (MIN_SDG as i64..=MAX_SDG as i64).contains(&n)
}

/// Display label for goal `n`, e.g. `13 → "Climate Action"`.
pub fn label(n: u8) -> Option<&'static str> {
    index(n).map(|i| LABELS[i])
}

/// PubMed Central base query for goal `n`.
pub fn search_query(n: u8) -> Option<&'static str> {
    index(n).map(|i| SEARCH_QUERIES[i])
}

fn index(n: u8) -> Option<usize> {
    if is_valid(n as i64) {
        Some(n as usize - 1)
    } else {
        None
    }
}
