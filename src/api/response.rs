use serde::Deserialize;
use serde_json::Value;

/// Identifier the service hands out either as a JSON string or a bare number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Id(pub String);

impl<'de> serde::Deserialize<'de> for Id {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        match Value::deserialize(d)? {
            Value::String(s) => Ok(Id(s)),
            Value::Number(n) => Ok(Id(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "expected string or number id, got {}",
                other
            ))),
        }
    }
}

pub mod login {
    use super::Id;
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Plant {
        pub plant_id: Id,
    }

    #[derive(Deserialize)]
    pub struct User {
        pub id: Id,
        pub rightlevel: Id,
    }

    #[derive(Deserialize)]
    pub struct Back {
        pub success: bool,
        pub msg: Option<String>,
        #[serde(default)]
        pub data: Vec<Plant>,
        pub user: Option<User>,
    }

    #[derive(Deserialize)]
    pub struct Login {
        pub back: Back,
    }
}

pub mod device_list {
    use serde::Deserialize;
    use serde_json::Value;

    #[derive(Deserialize)]
    pub struct Device {
        /// Current power in watts, as a string or number.
        pub power: Value,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DeviceList {
        pub device_list: Vec<Device>,
    }
}

/// Interpret a raw `power` field as watts. Strings and numbers are accepted; anything
/// that does not denote a finite float is rejected. Fractions are truncated toward zero.
pub fn parse_power(raw: &Value) -> Result<i64, String> {
    let value = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
    .ok_or_else(|| format!("malformed power value: {}", raw))?;

    let watts = value.trunc();
    if watts < i64::MIN as f64 || watts > i64::MAX as f64 {
        return Err(format!("power value out of range: {}", raw));
    }
    Ok(watts as i64)
}
