//! Component domain model and validator.
//!
//! # Responsibility
//! - Define the single inventory record shape and its classification enums.
//! - Decide whether a submitted record may be persisted.
//!
//! # Invariants
//! - `uid` is assigned by storage only; wire input never carries it.
//! - Every classification field holds a member of its fixed legal set.
//! - `xname` is non-empty and follows the location-code shape.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// System key assigned by the storage backend at creation.
pub type ComponentId = Uuid;

/// Upper bound on xname length accepted for writes.
pub const MAX_XNAME_LEN: usize = 64;

static XNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][0-9]+(?:[a-z]+[0-9]+)*$").expect("valid xname regex"));

/// Shared behavior of the fixed-vocabulary classification fields.
pub trait WireEnum: Sized + Copy + 'static {
    /// Wire/column name of the field holding this enum.
    const FIELD: &'static str;
    /// Every legal value, in declaration order.
    const ALL: &'static [Self];

    /// Wire and storage representation.
    fn as_str(self) -> &'static str;

    /// Strict, case-sensitive parse. `None` for anything outside the set.
    fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|item| item.as_str() == value)
    }

    /// Legal values joined with `|`, for error messages.
    fn expected() -> String {
        Self::ALL
            .iter()
            .map(|item| item.as_str())
            .collect::<Vec<_>>()
            .join("|")
    }
}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident => $field:literal {
            $( $(#[$vmeta:meta])* $variant:ident = $wire:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl WireEnum for $name {
            const FIELD: &'static str = $field;
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum! {
    /// Cabinet/cooling class of the hardware.
    HardwareClass => "class" {
        /// Standard air-cooled rack.
        River = "river",
        /// Liquid-cooled cabinet.
        Mountain = "mountain",
        /// Liquid-cooled cabinet in a standard rack footprint.
        Hill = "hill",
    }
}

wire_enum! {
    /// CPU architecture.
    Arch => "arch" {
        X86_64 = "x86_64",
        Aarch64 = "aarch64",
    }
}

wire_enum! {
    /// High-speed network fabric the component is attached to.
    NetType => "net_type" {
        Ethernet = "ethernet",
        Infiniband = "infiniband",
        Sling = "sling",
    }
}

wire_enum! {
    /// Operational role.
    Role => "role" {
        Compute = "compute",
        Service = "service",
        Management = "management",
        Storage = "storage",
        Application = "application",
    }
}

wire_enum! {
    /// Operational status flag.
    Flag => "flag" {
        Ok = "ok",
        Warning = "warning",
        Alert = "alert",
        Locked = "locked",
        Decommissioned = "decommissioned",
        Unknown = "unknown",
    }
}

/// Reason a component was refused for write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentValidationError {
    /// Required field is missing or empty.
    EmptyField(&'static str),
    /// Enumeration field holds a value outside its legal set.
    IllegalValue {
        field: &'static str,
        value: String,
        expected: String,
    },
    /// Xname exceeds `MAX_XNAME_LEN` characters.
    XnameTooLong(usize),
    /// Xname is not a location code such as `x3000c0s7b0n3` or `d0w1`.
    MalformedXname(String),
    /// Update requires the system key.
    MissingUid,
}

impl ComponentValidationError {
    /// Name of the offending wire field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyField(field) | Self::IllegalValue { field, .. } => *field,
            Self::XnameTooLong(_) | Self::MalformedXname(_) => "xname",
            Self::MissingUid => "uid",
        }
    }
}

impl Display for ComponentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "{field} must not be empty"),
            Self::IllegalValue {
                field,
                value,
                expected,
            } => write!(f, "{field} `{value}` is not one of {expected}"),
            Self::XnameTooLong(len) => write!(
                f,
                "xname is {len} characters long; at most {MAX_XNAME_LEN} are allowed"
            ),
            Self::MalformedXname(xname) => {
                write!(f, "xname `{xname}` is not a valid location code")
            }
            Self::MissingUid => write!(f, "uid is required to replace a component"),
        }
    }
}

impl Error for ComponentValidationError {}

/// One hardware inventory record.
///
/// Serialize-only. Wire input is decoded as [`ComponentInput`] and turned
/// into a component with [`ComponentInput::into_component`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Component {
    /// System key. `None` until the record has been inserted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<ComponentId>,
    /// Physical-location name; unique alternate key.
    pub xname: String,
    pub class: HardwareClass,
    pub arch: Arch,
    pub net_type: NetType,
    pub role: Role,
    pub flag: Flag,
}

impl Component {
    /// Creates an unsaved component. Call [`Component::validate`] before use.
    pub fn new(
        xname: impl Into<String>,
        class: HardwareClass,
        arch: Arch,
        net_type: NetType,
        role: Role,
        flag: Flag,
    ) -> Self {
        Self {
            uid: None,
            xname: xname.into(),
            class,
            arch,
            net_type,
            role,
            flag,
        }
    }

    /// Checks the record is fit for insert.
    ///
    /// Enumeration fields are typed, so only `xname` can be wrong here.
    pub fn validate(&self) -> Result<(), ComponentValidationError> {
        validate_xname(&self.xname)
    }

    /// Checks the record is fit for a full-row replace and returns the key
    /// the replace is addressed to.
    pub fn validate_for_update(&self) -> Result<ComponentId, ComponentValidationError> {
        let uid = self.uid.ok_or(ComponentValidationError::MissingUid)?;
        self.validate()?;
        Ok(uid)
    }

    /// Returns a copy with system-assigned fields cleared.
    pub fn without_uid(&self) -> Self {
        Self {
            uid: None,
            ..self.clone()
        }
    }
}

/// Raw wire shape of a submitted component.
///
/// Missing fields decode as empty strings so they are reported as
/// validation failures rather than decode failures. Unknown keys,
/// including `uid`, are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ComponentInput {
    pub xname: String,
    pub class: String,
    pub arch: String,
    pub net_type: String,
    pub role: String,
    pub flag: String,
}

impl ComponentInput {
    /// Runs the full rule set and produces an unsaved [`Component`].
    pub fn into_component(self) -> Result<Component, ComponentValidationError> {
        validate_xname(&self.xname)?;
        Ok(Component {
            uid: None,
            class: parse_field(&self.class)?,
            arch: parse_field(&self.arch)?,
            net_type: parse_field(&self.net_type)?,
            role: parse_field(&self.role)?,
            flag: parse_field(&self.flag)?,
            xname: self.xname,
        })
    }
}

impl From<&Component> for ComponentInput {
    fn from(value: &Component) -> Self {
        Self {
            xname: value.xname.clone(),
            class: value.class.as_str().to_string(),
            arch: value.arch.as_str().to_string(),
            net_type: value.net_type.as_str().to_string(),
            role: value.role.as_str().to_string(),
            flag: value.flag.as_str().to_string(),
        }
    }
}

/// Parses one enumeration field, rejecting empty and unknown values.
pub fn parse_field<T: WireEnum>(value: &str) -> Result<T, ComponentValidationError> {
    if value.is_empty() {
        return Err(ComponentValidationError::EmptyField(T::FIELD));
    }
    T::parse(value).ok_or_else(|| ComponentValidationError::IllegalValue {
        field: T::FIELD,
        value: value.to_string(),
        expected: T::expected(),
    })
}

fn validate_xname(xname: &str) -> Result<(), ComponentValidationError> {
    if xname.is_empty() {
        return Err(ComponentValidationError::EmptyField("xname"));
    }
    let len = xname.chars().count();
    if len > MAX_XNAME_LEN {
        return Err(ComponentValidationError::XnameTooLong(len));
    }
    if !XNAME_RE.is_match(xname) {
        return Err(ComponentValidationError::MalformedXname(xname.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ComponentInput {
        ComponentInput {
            xname: "x3000b7n3".to_string(),
            class: "river".to_string(),
            arch: "x86_64".to_string(),
            net_type: "ethernet".to_string(),
            role: "compute".to_string(),
            flag: "ok".to_string(),
        }
    }

    #[test]
    fn xname_pattern_accepts_location_codes() {
        for xname in ["x3000", "x3000b7n3", "x1000c0s7b0n0", "x9000c1r3j16", "d0w1", "s0"] {
            assert!(validate_xname(xname).is_ok(), "{xname} should be accepted");
        }
    }

    #[test]
    fn xname_pattern_rejects_free_text() {
        for xname in ["node01", "x", "X3000", "x3000 ", " x3000", "x3000b", "x30-00", "3000"] {
            assert_eq!(
                validate_xname(xname),
                Err(ComponentValidationError::MalformedXname(xname.to_string())),
            );
        }
    }

    #[test]
    fn overlong_xname_is_reported_with_length() {
        let xname = format!("x{}", "1".repeat(MAX_XNAME_LEN));
        assert_eq!(
            validate_xname(&xname),
            Err(ComponentValidationError::XnameTooLong(MAX_XNAME_LEN + 1))
        );
    }

    #[test]
    fn enum_parse_is_exact() {
        assert_eq!(NetType::parse("infiniband"), Some(NetType::Infiniband));
        assert_eq!(NetType::parse("Infiniband"), None);
        assert_eq!(NetType::parse("token ring"), None);
        assert_eq!(Arch::parse("x86_64"), Some(Arch::X86_64));
    }

    #[test]
    fn empty_enum_field_is_empty_not_illegal() {
        let mut raw = input();
        raw.role.clear();
        assert_eq!(
            raw.into_component(),
            Err(ComponentValidationError::EmptyField("role"))
        );
    }

    #[test]
    fn illegal_value_names_field_and_legal_set() {
        let mut raw = input();
        raw.flag = "broken".to_string();
        let err = raw.into_component().unwrap_err();
        assert_eq!(err.field(), "flag");
        assert_eq!(
            err.to_string(),
            "flag `broken` is not one of ok|warning|alert|locked|decommissioned|unknown"
        );
    }

    #[test]
    fn input_round_trips_through_component() {
        let component = input().into_component().unwrap();
        assert_eq!(ComponentInput::from(&component), input());
    }
}
