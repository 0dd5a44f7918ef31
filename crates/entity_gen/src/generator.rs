//! Entity graph generator.
//!
//! Entities only reference earlier entities unless cycles are enabled, so the
//! default output always has a valid creation order.

use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

/// Basic field types every dialect can render
const PORTABLE_TYPES: &[&str] = &[
    "string",
    "long",
    "int",
    "boolean",
    "decimal",
    "date",
    "timestamp",
    "text",
    "double",
];

/// Generation scale presets
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scale {
    /// 12 entities
    Small,
    /// 150 entities
    Medium,
    /// 2,000 entities
    Large,
}

impl Scale {
    pub fn entities(&self) -> usize {
        match self {
            Scale::Small => 12,
            Scale::Medium => 150,
            Scale::Large => 2_000,
        }
    }

    pub fn max_fields(&self) -> usize {
        match self {
            Scale::Small => 4,
            Scale::Medium => 6,
            Scale::Large => 8,
        }
    }

    pub fn max_references(&self) -> usize {
        match self {
            Scale::Small => 2,
            Scale::Medium => 3,
            Scale::Large => 4,
        }
    }
}

impl std::str::FromStr for Scale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "small" | "s" => Ok(Scale::Small),
            "medium" | "m" => Ok(Scale::Medium),
            "large" | "l" => Ok(Scale::Large),
            _ => Err(format!(
                "Unknown scale: {}. Use small, medium, or large",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedRelation {
    pub kind: &'static str,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedField {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<&'static str>,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<GeneratedRelation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedEntity {
    pub name: String,
    pub primary_key: Vec<String>,
    pub fields: Vec<GeneratedField>,
}

impl GeneratedEntity {
    /// Targets of this entity's many-to-one fields
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter_map(|f| f.relation.as_ref())
            .filter(|r| r.kind == "many-to-one")
            .map(|r| r.target.as_str())
    }
}

/// A generated entity document (bare `entities` list)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedDocument {
    pub entities: Vec<GeneratedEntity>,
}

impl GeneratedDocument {
    pub fn to_yaml(&self) -> Result<String, serde_yaml_ng::Error> {
        serde_yaml_ng::to_string(self)
    }

    /// Number of tables the document maps to, join tables included
    pub fn table_count(&self) -> usize {
        let mut pairs: Vec<(String, String)> = Vec::new();
        for entity in &self.entities {
            for field in &entity.fields {
                if let Some(rel) = field.relation.as_ref().filter(|r| r.kind == "many-to-many") {
                    let pair = if entity.name <= rel.target {
                        (entity.name.clone(), rel.target.clone())
                    } else {
                        (rel.target.clone(), entity.name.clone())
                    };
                    if !pairs.contains(&pair) {
                        pairs.push(pair);
                    }
                }
            }
        }
        self.entities.len() + pairs.len()
    }
}

pub struct Generator {
    rng: ChaCha8Rng,
    scale: Scale,
    cycle_ratio: f64,
    many_to_many_ratio: f64,
}

impl Generator {
    pub fn new(seed: u64, scale: Scale) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            scale,
            cycle_ratio: 0.0,
            many_to_many_ratio: 0.1,
        }
    }

    /// Probability that an entity also references a later entity
    pub fn with_cycles(mut self, ratio: f64) -> Self {
        self.cycle_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Probability that an entity declares a many-to-many field
    pub fn with_many_to_many(mut self, ratio: f64) -> Self {
        self.many_to_many_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn generate(&mut self) -> GeneratedDocument {
        let count = self.scale.entities();
        let names: Vec<String> = (0..count).map(entity_name).collect();
        let entities = (0..count).map(|i| self.entity(i, &names)).collect();
        GeneratedDocument { entities }
    }

    fn entity(&mut self, index: usize, names: &[String]) -> GeneratedEntity {
        let mut fields = vec![GeneratedField {
            name: "id".to_string(),
            type_name: Some("long"),
            nullable: false,
            relation: None,
        }];

        let basic = self.rng.random_range(1..=self.scale.max_fields());
        for k in 0..basic {
            let type_name = PORTABLE_TYPES.choose(&mut self.rng).copied().unwrap_or("string");
            fields.push(GeneratedField {
                name: format!("attr_{}", k),
                type_name: Some(type_name),
                nullable: self.rng.random_bool(0.7),
                relation: None,
            });
        }

        if index > 0 {
            let refs = self.rng.random_range(0..=self.scale.max_references());
            for k in 0..refs {
                let target = self.rng.random_range(0..index);
                fields.push(relation_field(
                    format!("ref_{}", k),
                    "many-to-one",
                    &names[target],
                    self.rng.random_bool(0.5),
                ));
            }
        }

        if index + 1 < names.len() && self.rng.random_bool(self.cycle_ratio) {
            let target = self.rng.random_range(index + 1..names.len());
            fields.push(relation_field(
                "back_ref".to_string(),
                "many-to-one",
                &names[target],
                true,
            ));
        }

        if index > 0 && self.rng.random_bool(self.many_to_many_ratio) {
            let target = self.rng.random_range(0..index);
            fields.push(relation_field(
                "links".to_string(),
                "many-to-many",
                &names[target],
                true,
            ));
        }

        GeneratedEntity {
            name: names[index].clone(),
            primary_key: vec!["id".to_string()],
            fields,
        }
    }
}

fn entity_name(index: usize) -> String {
    format!("Entity{:04}", index)
}

fn relation_field(name: String, kind: &'static str, target: &str, nullable: bool) -> GeneratedField {
    GeneratedField {
        name,
        type_name: None,
        nullable,
        relation: Some(GeneratedRelation {
            kind,
            target: target.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_deterministic() {
        let doc1 = Generator::new(42, Scale::Medium).generate();
        let doc2 = Generator::new(42, Scale::Medium).generate();
        assert_eq!(doc1, doc2);

        let doc3 = Generator::new(7, Scale::Medium).generate();
        assert_ne!(doc1, doc3);
    }

    #[test]
    fn test_acyclic_by_default() {
        let doc = Generator::new(1, Scale::Medium).generate();
        for (i, entity) in doc.entities.iter().enumerate() {
            for target in entity.references() {
                let pos = doc.entities.iter().position(|e| e.name == target).unwrap();
                assert!(pos < i, "{} references later {}", entity.name, target);
            }
        }
    }

    #[test]
    fn test_cycles_reference_later_entities() {
        let doc = Generator::new(3, Scale::Small).with_cycles(1.0).generate();
        let first = &doc.entities[0];
        assert!(first.fields.iter().any(|f| f.name == "back_ref"));
    }

    #[test]
    fn test_yaml_shape() {
        let doc = Generator::new(42, Scale::Small)
            .with_many_to_many(1.0)
            .generate();
        let yaml = doc.to_yaml().unwrap();
        assert!(yaml.starts_with("entities:"));
        assert!(yaml.contains("kind: many-to-many"));
        assert!(yaml.contains("type: long"));
        assert!(doc.table_count() > doc.entities.len());
    }

    #[test]
    fn test_scale_parse() {
        assert_eq!("m".parse::<Scale>().unwrap(), Scale::Medium);
        assert!("huge".parse::<Scale>().is_err());
    }
}
