use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableSet {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubParameter {
    pub id: i64,
    pub set_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterValue {
    pub id: i64,
    pub sub_parameter_id: i64,
    pub label: String,
    pub value: f64,
    pub description: Option<String>,
    pub order: i32,
}

/// One (combination, year) row of pre-computed output metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationResult {
    pub id: i64,
    pub combination_key: String,
    pub year: i32,
    pub scc_value: Option<f64>,
    pub temperature: Option<f64>,
    pub damage_cost: Option<f64>,
    pub gdp_loss: Option<f64>,
    pub metadata: Option<Value>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogParameter {
    #[serde(flatten)]
    pub parameter: SubParameter,
    pub values: Vec<ParameterValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSet {
    #[serde(flatten)]
    pub set: VariableSet,
    pub sub_parameters: Vec<CatalogParameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSetting {
    pub id: i64,
    pub chart_key: String,
    pub title: String,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub updated_at: Option<String>,
}

/// Label fields left as `None` keep their stored value on update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSettingUpdate {
    pub title: String,
    #[serde(default)]
    pub x_label: Option<String>,
    #[serde(default)]
    pub y_label: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChartSetting {
    pub chart_key: String,
    #[serde(flatten)]
    pub fields: ChartSettingUpdate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub content: Option<String>,
    pub published: bool,
    pub updated_at: Option<String>,
    pub created_at: Option<String>,
}

/// `content` and `published` left as `None` keep their stored value on update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageUpdate {
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataCounts {
    pub results: i64,
    pub variables: i64,
    pub parameters: i64,
    pub values: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewVariableSet {
    pub name: String,
    pub description: Option<String>,
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSubParameter {
    pub set_id: i64,
    pub name: String,
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewParameterValue {
    pub sub_parameter_id: i64,
    pub label: String,
    pub value: f64,
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewResult {
    pub combination_key: String,
    pub year: i32,
    pub scc_value: Option<f64>,
    pub temperature: Option<f64>,
    pub damage_cost: Option<f64>,
    pub gdp_loss: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_serializes_flat_camel_case() {
        let set = CatalogSet {
            set: VariableSet {
                id: 1,
                name: "Discount rate".to_string(),
                description: None,
                order: 1,
            },
            sub_parameters: vec![CatalogParameter {
                parameter: SubParameter {
                    id: 7,
                    set_id: 1,
                    name: "PRTP".to_string(),
                    description: None,
                    order: 1,
                },
                values: vec![],
            }],
        };
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["name"], "Discount rate");
        assert_eq!(json["subParameters"][0]["setId"], 1);
        assert!(json["subParameters"][0]["values"].as_array().unwrap().is_empty());
    }

    #[test]
    fn admin_user_hides_password_hash() {
        let user = AdminUser {
            id: 1,
            email: "admin@example.org".to_string(),
            name: "Admin".to_string(),
            password_hash: "sha256$1$00$00".to_string(),
            created_at: None,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("sha256"));
        assert!(!json.contains("passwordHash"));
    }
}
