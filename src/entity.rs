//! Entity identity and the JSON-LD bodies sent to the context broker

use serde_json::{Map, Value};

use crate::property::PropertySet;

/// Core context attached to every fragment and entity
pub const NGSI_LD_CORE_CONTEXT: &str =
    "https://uri.etsi.org/ngsi-ld/v1/ngsi-ld-core-context.jsonld";

/// `urn:ngsi-ld:<TypeName>:<qualifier...>:<localId>`
pub fn entity_id(type_name: &str, qualifiers: &[&str], local_id: &str) -> String {
    let mut id = format!("urn:ngsi-ld:{type_name}");
    for qualifier in qualifiers {
        id.push(':');
        id.push_str(qualifier);
    }
    id.push(':');
    id.push_str(local_id);
    id
}

/// Entity id of a device
pub fn device_urn(device_id: &str) -> String {
    entity_id("Device", &[], device_id)
}

/// One synthesized entity update, ready to be upserted
#[derive(Debug, Clone, PartialEq)]
pub struct EntityUpdate {
    pub id: String,
    pub entity_type: String,
    pub properties: PropertySet,
}

impl EntityUpdate {
    pub fn new<I: Into<String>, T: Into<String>>(id: I, entity_type: T, properties: PropertySet) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
            properties,
        }
    }

    /// Attribute fragment for a partial (merge) update
    pub fn fragment(&self) -> serde_json::Result<Value> {
        let mut body = Map::new();
        body.insert("@context".into(), default_context());
        body.extend(self.attributes()?);
        Ok(Value::Object(body))
    }

    /// Full entity body for creation
    pub fn entity(&self) -> serde_json::Result<Value> {
        let mut body = Map::new();
        body.insert("id".into(), Value::String(self.id.clone()));
        body.insert("type".into(), Value::String(self.entity_type.clone()));
        body.insert("@context".into(), default_context());
        body.extend(self.attributes()?);
        Ok(Value::Object(body))
    }

    fn attributes(&self) -> serde_json::Result<Map<String, Value>> {
        match serde_json::to_value(&self.properties)? {
            Value::Object(attributes) => Ok(attributes),
            _ => Ok(Map::new()),
        }
    }
}

fn default_context() -> Value {
    Value::Array(vec![Value::String(NGSI_LD_CORE_CONTEXT.to_string())])
}
