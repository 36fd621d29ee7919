//! Field types and segment helpers shared by several transactions.

use serde::{Deserialize, Serialize};
use x12_segment::{Segment, SegmentWriter};

use super::{Entity, Reader};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityType {
    #[default]
    #[serde(rename = "1")]
    Person,
    #[serde(rename = "2")]
    NonPerson,
}

impl EntityType {
    pub fn code(self) -> &'static str {
        match self {
            Self::Person => "1",
            Self::NonPerson => "2",
        }
    }

    fn from_code(code: &str) -> Self {
        if code == "2" {
            Self::NonPerson
        } else {
            Self::Person
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "U")]
    Unknown,
}

impl Gender {
    pub fn code(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
            Self::Unknown => "U",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "M" => Some(Self::Male),
            "F" => Some(Self::Female),
            "U" => Some(Self::Unknown),
            _ => None,
        }
    }
}

/// NM103-NM107 plus NM102
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Name {
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(default)]
    pub entity_type: EntityType,
}

impl Name {
    pub fn person(last_name: &str, first_name: &str) -> Self {
        Self {
            last_name: last_name.to_string(),
            first_name: Some(first_name.to_string()).filter(|f| !f.is_empty()),
            ..Default::default()
        }
    }

    pub(crate) fn read(nm1: &Segment) -> Self {
        Self {
            last_name: nm1.element(3).to_string(),
            first_name: owned(nm1.optional(4)),
            middle_name: owned(nm1.optional(5)),
            prefix: owned(nm1.optional(6)),
            suffix: owned(nm1.optional(7)),
            entity_type: EntityType::from_code(nm1.element(2)),
        }
    }
}

/// N3 + N4
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl Address {
    /// Address from the N3/N4 in an entity scope, if either is present
    pub(crate) fn read(scope: &Reader<'_>) -> Option<Self> {
        let n3 = scope.first("N3");
        let n4 = scope.first("N4");
        if n3.is_none() && n4.is_none() {
            return None;
        }
        let element = |s: Option<&Segment>, n| s.map(|s| s.element(n)).unwrap_or("").to_string();
        Some(Self {
            address_line1: element(n3, 1),
            address_line2: owned(n3.and_then(|s| s.optional(2))),
            city: element(n4, 1),
            state: element(n4, 2),
            postal_code: element(n4, 3),
        })
    }

    pub(crate) fn write(&self, writer: &mut SegmentWriter) {
        writer.push(
            "N3",
            [
                self.address_line1.as_str(),
                self.address_line2.as_deref().unwrap_or(""),
            ],
        );
        writer.push("N4", [&self.city, &self.state, &self.postal_code]);
    }
}

/// A `D8` date or an `RD8` range
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub from_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_date: Option<String>,
}

impl DateRange {
    pub fn single(date: &str) -> Self {
        Self {
            from_date: date.to_string(),
            to_date: None,
        }
    }

    /// Date value of a DTP (element 3) or DTM (element 2) style pair:
    /// `format` names the qualifier element, the value follows it
    pub(crate) fn read(segment: &Segment, format: usize) -> Self {
        let value = segment.element(format + 1);
        match (segment.element(format), value.split_once('-')) {
            ("RD8", Some((from, to))) => Self {
                from_date: from.to_string(),
                to_date: Some(to.to_string()),
            },
            _ => Self::single(value),
        }
    }

    pub(crate) fn write(&self, writer: &mut SegmentWriter, qualifier: &str) {
        match &self.to_date {
            Some(to) => {
                let value = format!("{}-{}", self.from_date, to);
                writer.push("DTP", [qualifier, "RD8", value.as_str()]);
            }
            None => writer.push("DTP", [qualifier, "D8", self.from_date.as_str()]),
        }
    }
}

/// A provider identified by person name and NPI (rendering, referring, attending)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRef {
    pub name: Name,
    pub npi: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomy_code: Option<String>,
}

impl ProviderRef {
    /// Provider from an `NM1`, taxonomy from the `PRV` with `role` in its scope
    pub(crate) fn read(entity: &Entity<'_>, role: &str) -> Self {
        Self {
            name: Name::read(entity.head),
            npi: entity.head.element(9).to_string(),
            taxonomy_code: entity
                .scope
                .find("PRV", 1, role)
                .and_then(|prv| prv.optional(3))
                .map(str::to_string),
        }
    }

    pub(crate) fn write(&self, writer: &mut SegmentWriter, entity_code: &str, role: &str) {
        write_name(writer, entity_code, &self.name, "XX", &self.npi);
        if let Some(taxonomy) = &self.taxonomy_code {
            writer.push("PRV", [role, "PXC", taxonomy.as_str()]);
        }
    }
}

/// Payer acting as information source (NM1*PR)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InformationSource {
    pub name: String,
    pub payer_id: String,
}

impl InformationSource {
    pub(crate) fn read(reader: &Reader<'_>, entity_code: &str) -> Self {
        reader
            .entity(entity_code)
            .map(|e| Self {
                name: e.head.element(3).to_string(),
                payer_id: e.head.element(9).to_string(),
            })
            .unwrap_or_default()
    }

    pub(crate) fn write(&self, writer: &mut SegmentWriter, entity_code: &str) {
        write_organization(writer, entity_code, &self.name, "PI", &self.payer_id);
    }
}

/// Provider or clearinghouse receiving the response (NM1*1P, NM1*41)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InformationReceiver {
    pub name: String,
    pub npi: String,
}

impl InformationReceiver {
    pub(crate) fn read(reader: &Reader<'_>, entity_code: &str) -> Self {
        reader
            .entity(entity_code)
            .map(|e| Self {
                name: e.head.element(3).to_string(),
                npi: e.head.element(9).to_string(),
            })
            .unwrap_or_default()
    }

    pub(crate) fn write(&self, writer: &mut SegmentWriter, entity_code: &str) {
        write_organization(writer, entity_code, &self.name, "XX", &self.npi);
    }
}

/// Insured member of an inquiry (NM1*IL, REF*6P, DMG)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub member_id: String,
    pub name: Name,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_number: Option<String>,
}

impl Subscriber {
    pub(crate) fn read(reader: &Reader<'_>) -> Self {
        let Some(entity) = reader.entity("IL") else {
            return Self::default();
        };
        let (date_of_birth, gender) = read_demographics(&entity.scope);
        let member_id = entity
            .head
            .optional(9)
            .or_else(|| entity.scope.find("REF", 1, "IG").map(|r| r.element(2)))
            .unwrap_or("")
            .to_string();
        Self {
            member_id,
            name: Name::read(entity.head),
            date_of_birth,
            gender,
            group_number: reference(&entity.scope, "6P"),
        }
    }

    pub(crate) fn write(&self, writer: &mut SegmentWriter) {
        write_name(writer, "IL", &self.name, "MI", &self.member_id);
        if let Some(group) = &self.group_number {
            writer.push("REF", ["6P", group.as_str()]);
        }
        write_demographics(writer, self.date_of_birth.as_deref(), self.gender);
    }
}

/// Patient who is not the subscriber (HL 23)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependent {
    pub name: Name,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    /// INS02 individual relationship code (01 spouse, 19 child, ...)
    pub relationship_code: String,
}

impl Dependent {
    /// Dependent from the segments following HL 23, named by `entity_code`
    pub(crate) fn read(level: &Reader<'_>, entity_code: &str) -> Option<Self> {
        let entity = level.entity(entity_code)?;
        let (date_of_birth, gender) = read_demographics(&entity.scope);
        Some(Self {
            name: Name::read(entity.head),
            date_of_birth,
            gender,
            relationship_code: level
                .first("INS")
                .map(|ins| ins.element(2).to_string())
                .unwrap_or_default(),
        })
    }

    pub(crate) fn write(&self, writer: &mut SegmentWriter, entity_code: &str) {
        write_name(writer, entity_code, &self.name, "", "");
        if !self.relationship_code.is_empty() {
            writer.push("INS", ["N", self.relationship_code.as_str()]);
        }
        write_demographics(writer, self.date_of_birth.as_deref(), self.gender);
    }
}

pub(crate) fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

/// Monetary or quantity element; missing or unparsable reads as zero
pub(crate) fn amount(value: &str) -> f64 {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

pub(crate) fn optional_amount(value: Option<&str>) -> Option<f64> {
    value.map(amount)
}

/// Two decimal places, as monetary amounts are written
pub(crate) fn format_amount(value: f64) -> String {
    format!("{value:.2}")
}

/// Shortest decimal form, as quantities and percentages are written
pub(crate) fn format_quantity(value: f64) -> String {
    format!("{value}")
}

/// Value of the first `REF` with `qualifier` in a scope
pub(crate) fn reference(scope: &Reader<'_>, qualifier: &str) -> Option<String> {
    scope
        .find("REF", 1, qualifier)
        .and_then(|r| r.optional(2))
        .map(str::to_string)
}

/// Date of birth and gender from the first DMG in a scope
pub(crate) fn read_demographics(scope: &Reader<'_>) -> (Option<String>, Option<Gender>) {
    match scope.first("DMG") {
        Some(dmg) => (owned(dmg.optional(2)), Gender::from_code(dmg.element(3))),
        None => (None, None),
    }
}

pub(crate) fn write_demographics(
    writer: &mut SegmentWriter,
    date_of_birth: Option<&str>,
    gender: Option<Gender>,
) {
    if date_of_birth.is_none() && gender.is_none() {
        return;
    }
    writer.push(
        "DMG",
        [
            "D8",
            date_of_birth.unwrap_or(""),
            gender.map(Gender::code).unwrap_or(""),
        ],
    );
}

/// NM1 for a person or organization described by `name`
///
/// The identification code qualifier is dropped when there is no code.
pub(crate) fn write_name(
    writer: &mut SegmentWriter,
    entity_code: &str,
    name: &Name,
    qualifier: &str,
    id: &str,
) {
    let qualifier = if id.is_empty() { "" } else { qualifier };
    writer.push(
        "NM1",
        [
            entity_code,
            name.entity_type.code(),
            name.last_name.as_str(),
            name.first_name.as_deref().unwrap_or(""),
            name.middle_name.as_deref().unwrap_or(""),
            name.prefix.as_deref().unwrap_or(""),
            name.suffix.as_deref().unwrap_or(""),
            qualifier,
            id,
        ],
    );
}

/// NM1 for an organization known only by its name
pub(crate) fn write_organization(
    writer: &mut SegmentWriter,
    entity_code: &str,
    name: &str,
    qualifier: &str,
    id: &str,
) {
    let organization = Name {
        last_name: name.to_string(),
        entity_type: EntityType::NonPerson,
        ..Default::default()
    };
    write_name(writer, entity_code, &organization, qualifier, id);
}

/// `PER*IC` contact name and phone
pub(crate) fn read_contact(scope: &Reader<'_>) -> (Option<String>, Option<String>) {
    match scope.find("PER", 1, "IC") {
        Some(per) => (owned(per.optional(2)), owned(per.optional(4))),
        None => (None, None),
    }
}

pub(crate) fn write_contact(writer: &mut SegmentWriter, name: Option<&str>, phone: Option<&str>) {
    if name.is_none() && phone.is_none() {
        return;
    }
    let qualifier = if phone.is_some() { "TE" } else { "" };
    writer.push("PER", ["IC", name.unwrap_or(""), qualifier, phone.unwrap_or("")]);
}

/// `HC:<code>:<modifier>...` procedure composite split into code and modifiers
pub(crate) fn read_procedure(reader: &Reader<'_>, segment: &Segment, element: usize) -> (String, Vec<String>) {
    let components = reader.components(segment, element);
    let code = components.get(1).copied().unwrap_or("").to_string();
    let modifiers = components
        .iter()
        .skip(2)
        .filter(|m| !m.is_empty())
        .map(|m| m.to_string())
        .collect();
    (code, modifiers)
}

pub(crate) fn procedure_composite(writer: &SegmentWriter, code: &str, modifiers: &[String]) -> String {
    writer.composite(
        ["HC", code]
            .into_iter()
            .chain(modifiers.iter().map(String::as_str)),
    )
}

/// `BHT` date and time for generated documents
pub(crate) fn timestamp() -> (String, String) {
    let now = chrono::Local::now();
    (now.format("%Y%m%d").to_string(), now.format("%H%M").to_string())
}

/// Next HL ID and the ID of the level it nests under
#[derive(Debug, Default)]
pub(crate) struct Hierarchy {
    next: u32,
}

impl Hierarchy {
    /// Push `HL*<id>*<parent>*<level>*<child code>` and return the new ID
    pub fn push(
        &mut self,
        writer: &mut SegmentWriter,
        parent: Option<u32>,
        level: &str,
        has_children: bool,
    ) -> u32 {
        self.next += 1;
        let parent = parent.map(|p| p.to_string()).unwrap_or_default();
        writer.push(
            "HL",
            [
                self.next.to_string(),
                parent,
                level.to_string(),
                if has_children { "1" } else { "0" }.to_string(),
            ],
        );
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use x12_segment::Delimiters;

    #[test]
    fn test_amount_is_lenient() {
        assert_eq!(amount("1500"), 1500.0);
        assert_eq!(amount(" 12.50 "), 12.5);
        assert_eq!(amount(""), 0.0);
        assert_eq!(amount("N/A"), 0.0);
        assert_eq!(amount("NaN"), 0.0);
    }

    #[test]
    fn test_amount_formatting() {
        assert_eq!(format_amount(1500.0), "1500.00");
        assert_eq!(format_amount(0.1 + 0.2), "0.30");
        assert_eq!(format_quantity(1.0), "1");
        assert_eq!(format_quantity(2.5), "2.5");
    }

    #[test]
    fn test_name_read() {
        let nm1 = Segment::new("NM1", ["IL", "1", "DOE", "JANE", "Q", "", "JR", "MI", "W123"]);
        let name = Name::read(&nm1);
        assert_eq!(name.last_name, "DOE");
        assert_eq!(name.first_name.as_deref(), Some("JANE"));
        assert_eq!(name.middle_name.as_deref(), Some("Q"));
        assert_eq!(name.prefix, None);
        assert_eq!(name.suffix.as_deref(), Some("JR"));
        assert_eq!(name.entity_type, EntityType::Person);
    }

    #[test]
    fn test_write_name_drops_empty_qualifier() {
        let mut writer = SegmentWriter::new(Delimiters::default());
        write_name(&mut writer, "QC", &Name::person("DOE", "JOHN"), "MI", "");
        write_organization(&mut writer, "PR", "ACME", "PI", "12345");
        assert_eq!(writer.finish(false), "NM1*QC*1*DOE*JOHN~NM1*PR*2*ACME*****PI*12345~");
    }

    #[test]
    fn test_date_range() {
        let d8 = Segment::new("DTP", ["472", "D8", "20240101"]);
        assert_eq!(DateRange::read(&d8, 2), DateRange::single("20240101"));

        let rd8 = Segment::new("DTP", ["472", "RD8", "20240101-20240105"]);
        let range = DateRange::read(&rd8, 2);
        assert_eq!(range.to_date.as_deref(), Some("20240105"));

        let mut writer = SegmentWriter::new(Delimiters::default());
        range.write(&mut writer, "291");
        assert_eq!(writer.finish(false), "DTP*291*RD8*20240101-20240105~");
    }

    #[test]
    fn test_address_requires_n3_or_n4() {
        let segments = vec![Segment::new("DMG", ["D8", "19800101", "F"])];
        let reader = Reader::new(&segments, &Delimiters::default());
        assert_eq!(Address::read(&reader), None);
        assert_eq!(
            read_demographics(&reader),
            (Some("19800101".to_string()), Some(Gender::Female))
        );
    }

    #[test]
    fn test_procedure_composite() {
        let segments = vec![Segment::new("SV1", ["HC:99213:25::59", "100"])];
        let reader = Reader::new(&segments, &Delimiters::default());
        let (code, modifiers) = read_procedure(&reader, &segments[0], 1);
        assert_eq!(code, "99213");
        assert_eq!(modifiers, vec!["25", "59"]);

        let writer = SegmentWriter::new(Delimiters::default());
        assert_eq!(procedure_composite(&writer, &code, &modifiers), "HC:99213:25:59");
    }
}
