use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// What `/analyze` hands back: the model's mapping untouched, or a structured error
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NutritionReport {
    Analysis(Map<String, Value>),
    Error(ErrorResult),
}

impl NutritionReport {
    pub fn is_error(&self) -> bool {
        matches!(self, NutritionReport::Error(_))
    }

    /// Typed view of an analysis mapping, if its shape allows one
    pub fn summary(&self) -> Option<AnalysisResult> {
        match self {
            NutritionReport::Analysis(map) => {
                serde_json::from_value(Value::Object(map.clone())).ok()
            }
            NutritionReport::Error(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResult {
    pub error: String,
    pub original_response: String,
}

/// Lenient reading of the schema the prompt asks for. Missing keys default,
/// numbers may arrive as strings ("250 kcal").
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalysisResult {
    pub items: Vec<FoodItem>,
    #[serde(deserialize_with = "lenient_number")]
    pub total_calories: Option<f64>,
    pub health_rating: Option<Value>,
    pub micronutrients: Micronutrients,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FoodItem {
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub calories: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub carbs: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub protein: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub fat: Option<f64>,
    pub portion_size: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Micronutrients {
    pub vitamins: Vec<Nutrient>,
    pub minerals: Vec<Nutrient>,
}

/// Models answer with either `"Vitamin C"` or `{"name": "Vitamin C", ...}`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Nutrient {
    Name(String),
    Detailed { name: String },
}

impl FoodItem {
    /// "Rice (1 cup, 200 kcal)"
    pub fn label(&self) -> String {
        let name = self.name.as_deref().unwrap_or("unknown");
        let mut details = Vec::new();
        if let Some(portion) = self.portion_size.as_deref() {
            details.push(portion.to_string());
        }
        if let Some(calories) = self.calories {
            details.push(format!("{} kcal", calories));
        }

        if details.is_empty() {
            name.to_string()
        } else {
            format!("{} ({})", name, details.join(", "))
        }
    }
}

impl Nutrient {
    pub fn name(&self) -> &str {
        match self {
            Nutrient::Name(name) | Nutrient::Detailed { name } => name,
        }
    }
}

impl AnalysisResult {
    /// Item calories summed, for replies that leave out `total_calories`
    pub fn items_calories(&self) -> f64 {
        self.items.iter().filter_map(|item| item.calories).sum()
    }

    /// Summed (carbs, protein, fat) in grams over all items
    pub fn macro_totals(&self) -> (f64, f64, f64) {
        self.items.iter().fold((0.0, 0.0, 0.0), |(c, p, f), item| {
            (
                c + item.carbs.unwrap_or(0.0),
                p + item.protein.unwrap_or(0.0),
                f + item.fat.unwrap_or(0.0),
            )
        })
    }

    pub fn health_rating_label(&self) -> Option<String> {
        match self.health_rating.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_number))
}

fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_number(s),
        _ => None,
    }
}

/// First numeric run in a string: "1,250 kcal" -> 1250, "10-15 g" -> 10, "-3" -> -3
fn leading_number(s: &str) -> Option<f64> {
    let chars: Vec<char> = s.chars().collect();
    let starts_number = |i: usize| {
        let next_is_digit = chars.get(i + 1).map_or(false, |c| c.is_ascii_digit());
        match chars[i] {
            c if c.is_ascii_digit() => true,
            '-' | '.' => next_is_digit,
            _ => false,
        }
    };
    let start = (0..chars.len()).find(|&i| starts_number(i))?;

    let mut number = String::new();
    for (i, &c) in chars.iter().enumerate().skip(start) {
        let next_is_digit = chars.get(i + 1).map_or(false, |n| n.is_ascii_digit());
        match c {
            '-' if i == start => number.push(c),
            '0'..='9' | '.' => number.push(c),
            // thousands separator
            ',' if next_is_digit => {}
            _ => break,
        }
    }

    number.parse::<f64>().ok()
}
