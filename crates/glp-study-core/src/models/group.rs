//! Study group and animal models.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{null_as_default, string_or_number};
use crate::schedule::normalize_date;

/// Species of the animals in a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeciesType {
    Rat,
    Pig,
    Dog,
    Monkey,
    Other,
}

impl SpeciesType {
    /// Parse the single-letter species code sent by the API.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_uppercase().as_str() {
            "R" => SpeciesType::Rat,
            "P" => SpeciesType::Pig,
            "D" => SpeciesType::Dog,
            "M" => SpeciesType::Monkey,
            _ => SpeciesType::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SpeciesType::Rat => "Rat",
            SpeciesType::Pig => "Pig",
            SpeciesType::Dog => "Dog",
            SpeciesType::Monkey => "Monkey",
            SpeciesType::Other => "Other",
        }
    }
}

/// Animal sex as recorded in the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Sex {
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_uppercase().as_str() {
            "M" => Sex::Male,
            "F" => Sex::Female,
            _ => Sex::Unknown,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
            Sex::Unknown => "",
        }
    }
}

impl Serialize for Sex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Sex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Sex::from_code).unwrap_or_default())
    }
}

/// A single animal on a group roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Animal {
    /// Animal identifier (unit of completion counting)
    #[serde(rename = "a_id", deserialize_with = "string_or_number")]
    pub id: String,
    /// Sex code
    #[serde(rename = "a_type", default)]
    pub sex: Sex,
    /// Supplier
    #[serde(default)]
    pub source: Option<String>,
    /// Strain
    #[serde(default)]
    pub strain: Option<String>,
    /// Supplier serial number
    #[serde(rename = "a_srl_num", default)]
    pub serial_number: Option<String>,
    /// Acquisition date as sent by the API (usually `YYYYMMDD`)
    #[serde(default)]
    pub source_date: Option<String>,
}

impl Animal {
    /// Create an animal with only an identifier and sex.
    pub fn new(id: impl Into<String>, sex: Sex) -> Self {
        Self {
            id: id.into(),
            sex,
            source: None,
            strain: None,
            serial_number: None,
            source_date: None,
        }
    }

    /// Parsed acquisition date, if present and well-formed.
    pub fn acquired_on(&self) -> Option<NaiveDate> {
        self.source_date.as_deref().and_then(normalize_date)
    }
}

/// A study group belonging to a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Group {
    /// Group identifier
    pub id: i64,
    /// Group name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Study type label (e.g. "Control", "High Dose")
    #[serde(default, deserialize_with = "null_as_default")]
    pub study_type: String,
    /// Species code (R, P, D, M)
    #[serde(default, deserialize_with = "null_as_default")]
    pub species_type: String,
    /// Title of the owning project
    #[serde(default)]
    pub project_title: Option<String>,
    /// Declared number of males
    #[serde(default, deserialize_with = "null_as_default")]
    pub no_of_male: u32,
    /// Declared number of females
    #[serde(default, deserialize_with = "null_as_default")]
    pub no_of_female: u32,
    /// Male roster
    #[serde(rename = "rat_list_m", default, deserialize_with = "null_as_default")]
    pub male_animals: Vec<Animal>,
    /// Female roster
    #[serde(rename = "rat_list_f", default, deserialize_with = "null_as_default")]
    pub female_animals: Vec<Animal>,
}

impl Group {
    /// Create an empty group.
    pub fn new(id: i64, name: impl Into<String>, species_type: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id,
            study_type: name.clone(),
            name,
            species_type: species_type.into(),
            project_title: None,
            no_of_male: 0,
            no_of_female: 0,
            male_animals: Vec::new(),
            female_animals: Vec::new(),
        }
    }

    pub fn species(&self) -> SpeciesType {
        SpeciesType::from_code(&self.species_type)
    }

    /// Expected roster: males then females, duplicates removed.
    ///
    /// When both rosters are empty the IDs are synthesized from the declared
    /// counts as `<species code><n>`, numbering females after males.
    pub fn animal_ids(&self) -> Vec<String> {
        if self.male_animals.is_empty() && self.female_animals.is_empty() {
            return self.synthesized_ids();
        }

        let mut seen = HashSet::new();
        self.male_animals
            .iter()
            .chain(self.female_animals.iter())
            .map(|a| a.id.clone())
            .filter(|id| seen.insert(id.clone()))
            .collect()
    }

    fn synthesized_ids(&self) -> Vec<String> {
        let total = self.no_of_male + self.no_of_female;
        (1..=total)
            .map(|n| format!("{}{}", self.species_type, n))
            .collect()
    }
}
