//! Domain types for Conference Central.
//!
//! Identifiers, the two persisted records ([`Profile`] and [`Conference`]),
//! the input forms that create or update them, and the small response
//! wrappers returned by the API.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque, stable user identifier supplied by the authentication layer
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a `UserId` from its string form
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authenticated caller
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    /// Stable user id
    pub user_id: UserId,
    /// Primary email address
    pub email: String,
}

impl Identity {
    /// Creates a new `Identity`
    #[must_use]
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            email: email.into(),
        }
    }
}

/// Unique identifier for a conference
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConferenceId(Uuid);

impl ConferenceId {
    /// Creates a new random `ConferenceId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `ConferenceId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ConferenceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A websafe key could not be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed conference key: {0}")]
pub struct KeyError(String);

/// Full key of a conference: the organizer it belongs to plus its id.
///
/// Externally a key travels as an opaque, URL-safe string (see
/// [`ConferenceKey::to_websafe`]). Both parts must match for a lookup to
/// succeed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConferenceKey {
    organizer: UserId,
    id: ConferenceId,
}

impl ConferenceKey {
    /// Creates a key for conference `id` organized by `organizer`
    #[must_use]
    pub const fn new(organizer: UserId, id: ConferenceId) -> Self {
        Self { organizer, id }
    }

    /// Organizer (parent) of the conference
    #[must_use]
    pub const fn organizer(&self) -> &UserId {
        &self.organizer
    }

    /// Conference id
    #[must_use]
    pub const fn id(&self) -> ConferenceId {
        self.id
    }

    /// Encodes the key as an opaque URL-safe string
    #[must_use]
    pub fn to_websafe(&self) -> String {
        URL_SAFE_NO_PAD.encode(format!("{}:{}", self.id, self.organizer))
    }

    /// Decodes a websafe key produced by [`ConferenceKey::to_websafe`].
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] when the string is not valid base64, is not
    /// UTF-8, or does not contain a UUID and a non-empty organizer id.
    pub fn parse_websafe(websafe: &str) -> Result<Self, KeyError> {
        let malformed = || KeyError(websafe.to_string());

        let bytes = URL_SAFE_NO_PAD
            .decode(websafe.trim())
            .map_err(|_| malformed())?;
        let raw = String::from_utf8(bytes).map_err(|_| malformed())?;
        let (id, organizer) = raw.split_once(':').ok_or_else(malformed)?;
        if organizer.is_empty() {
            return Err(malformed());
        }
        let id = Uuid::parse_str(id).map_err(|_| malformed())?;

        Ok(Self::new(UserId::new(organizer), ConferenceId::from_uuid(id)))
    }
}

impl fmt::Display for ConferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_websafe())
    }
}

impl FromStr for ConferenceKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_websafe(s)
    }
}

impl Serialize for ConferenceKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_websafe())
    }
}

impl<'de> Deserialize<'de> for ConferenceKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let websafe = String::deserialize(deserializer)?;
        Self::parse_websafe(&websafe).map_err(serde::de::Error::custom)
    }
}

/// Optimistic concurrency version of a persisted record.
///
/// The first committed write of a record produces [`Version::initial`];
/// every later write increments it by one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version(u64);

impl Version {
    /// Creates a version from its raw value
    #[must_use]
    pub const fn new(version: u64) -> Self {
        Self(version)
    }

    /// Version assigned by the first write of a record
    #[must_use]
    pub const fn initial() -> Self {
        Self(1)
    }

    /// Get the raw value
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// The version that follows this one
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Profile
// ============================================================================

/// T-shirt size preference
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeeShirtSize {
    /// No preference given
    #[default]
    NotSpecified,
    /// Extra small
    Xs,
    /// Small
    S,
    /// Medium
    M,
    /// Large
    L,
    /// Extra large
    Xl,
    /// 2x large
    Xxl,
    /// 3x large
    Xxxl,
}

impl TeeShirtSize {
    /// Wire and storage name of the size
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotSpecified => "NOT_SPECIFIED",
            Self::Xs => "XS",
            Self::S => "S",
            Self::M => "M",
            Self::L => "L",
            Self::Xl => "XL",
            Self::Xxl => "XXL",
            Self::Xxxl => "XXXL",
        }
    }
}

impl fmt::Display for TeeShirtSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeeShirtSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_SPECIFIED" => Ok(Self::NotSpecified),
            "XS" => Ok(Self::Xs),
            "S" => Ok(Self::S),
            "M" => Ok(Self::M),
            "L" => Ok(Self::L),
            "XL" => Ok(Self::Xl),
            "XXL" => Ok(Self::Xxl),
            "XXXL" => Ok(Self::Xxxl),
            other => Err(format!("unknown tee shirt size: {other}")),
        }
    }
}

/// Input of `saveProfile`; absent fields leave the stored value untouched
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileForm {
    /// New display name
    pub display_name: Option<String>,
    /// New t-shirt size
    pub tee_shirt_size: Option<TeeShirtSize>,
}

/// A user's profile
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Owner of the profile
    pub user_id: UserId,
    /// Name shown to other users
    pub display_name: String,
    /// Contact email
    pub main_email: String,
    /// T-shirt size preference
    pub tee_shirt_size: TeeShirtSize,
    /// Conferences this user is registered for, in registration order
    pub conference_keys_to_attend: Vec<ConferenceKey>,
}

impl Profile {
    /// Builds the profile a user gets before ever saving one.
    ///
    /// The display name defaults to the local part of the email address.
    #[must_use]
    pub fn new_default(identity: &Identity) -> Self {
        Self {
            user_id: identity.user_id.clone(),
            display_name: default_display_name(&identity.email),
            main_email: identity.email.clone(),
            tee_shirt_size: TeeShirtSize::NotSpecified,
            conference_keys_to_attend: Vec::new(),
        }
    }

    /// Applies the fields present in `form`
    pub fn apply_form(&mut self, form: ProfileForm) {
        if let Some(display_name) = form.display_name {
            self.display_name = display_name;
        }
        if let Some(size) = form.tee_shirt_size {
            self.tee_shirt_size = size;
        }
    }

    /// Whether this user is registered for the conference
    #[must_use]
    pub fn is_attending(&self, key: &ConferenceKey) -> bool {
        self.conference_keys_to_attend.contains(key)
    }

    /// Records a registration; the list stays duplicate-free
    pub fn add_conference_key(&mut self, key: ConferenceKey) {
        if !self.is_attending(&key) {
            self.conference_keys_to_attend.push(key);
        }
    }

    /// Removes a registration, returning whether it was present
    pub fn remove_conference_key(&mut self, key: &ConferenceKey) -> bool {
        let before = self.conference_keys_to_attend.len();
        self.conference_keys_to_attend.retain(|k| k != key);
        self.conference_keys_to_attend.len() != before
    }
}

/// Local part of an email address, or the whole string when it has no `@`
#[must_use]
pub fn default_display_name(email: &str) -> String {
    email
        .split_once('@')
        .map_or(email, |(local, _)| local)
        .to_string()
}

// ============================================================================
// Conference
// ============================================================================

/// Input of `createConference`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConferenceForm {
    /// Conference name (required)
    pub name: Option<String>,
    /// Free-form description
    pub description: Option<String>,
    /// Topics covered
    pub topics: Option<Vec<String>>,
    /// Host city
    pub city: Option<String>,
    /// First day
    pub start_date: Option<NaiveDate>,
    /// Last day
    pub end_date: Option<NaiveDate>,
    /// Total seats, 0 when absent
    pub max_attendees: Option<u32>,
}

/// Largest capacity a conference may have; seat counters are stored as
/// signed 32-bit integers.
pub const MAX_ATTENDEES_LIMIT: u32 = i32::MAX.unsigned_abs();

impl ConferenceForm {
    /// Checks the form before a conference is built from it.
    ///
    /// # Errors
    ///
    /// Returns a message when the name is missing or blank, when
    /// `max_attendees` exceeds [`MAX_ATTENDEES_LIMIT`], or when the end date
    /// precedes the start date.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.as_deref().is_none_or(|name| name.trim().is_empty()) {
            return Err("Conference 'name' field required".to_string());
        }

        if let Some(max) = self.max_attendees.filter(|&max| max > MAX_ATTENDEES_LIMIT) {
            return Err(format!(
                "Conference 'maxAttendees' must be at most {MAX_ATTENDEES_LIMIT}, got {max}"
            ));
        }

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(format!(
                    "Conference end date {end} is before start date {start}"
                ));
            }
        }

        Ok(())
    }
}

/// Seat counter updates that would break `0 <= seats_available <= max_attendees`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeatError {
    /// Booking more seats than are left
    #[error("not enough seats: requested {requested}, available {available}")]
    NotEnoughSeats {
        /// Seats requested
        requested: u32,
        /// Seats left
        available: u32,
    },

    /// Returning seats past the conference capacity
    #[error(
        "seat return of {returned} would exceed capacity {max_attendees} (available {available})"
    )]
    ExceedsCapacity {
        /// Seats returned
        returned: u32,
        /// Seats currently available
        available: u32,
        /// Capacity
        max_attendees: u32,
    },
}

/// A conference organized by a user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conference {
    /// Full key, exposed as the websafe string
    #[serde(rename = "websafeKey")]
    pub key: ConferenceKey,
    /// Conference name
    pub name: String,
    /// Free-form description
    pub description: Option<String>,
    /// Topics covered
    pub topics: Vec<String>,
    /// Host city
    pub city: Option<String>,
    /// First day
    pub start_date: Option<NaiveDate>,
    /// Last day
    pub end_date: Option<NaiveDate>,
    /// Month of `start_date` (1-12), 0 without a start date
    pub month: u32,
    /// Total seats
    pub max_attendees: u32,
    /// Seats not yet booked
    pub seats_available: u32,
}

impl Conference {
    /// Builds a new conference from a validated form.
    ///
    /// All seats start out available.
    #[must_use]
    pub fn from_form(key: ConferenceKey, form: ConferenceForm) -> Self {
        let max_attendees = form.max_attendees.unwrap_or(0);
        Self {
            key,
            name: form.name.map(|name| name.trim().to_string()).unwrap_or_default(),
            description: form.description,
            topics: form.topics.unwrap_or_default(),
            city: form.city,
            start_date: form.start_date,
            end_date: form.end_date,
            month: month_of(form.start_date),
            max_attendees,
            seats_available: max_attendees,
        }
    }

    /// Organizer of the conference
    #[must_use]
    pub const fn organizer_user_id(&self) -> &UserId {
        self.key.organizer()
    }

    /// Takes `count` seats.
    ///
    /// # Errors
    ///
    /// Returns [`SeatError::NotEnoughSeats`] when fewer than `count` seats are left.
    pub fn book_seats(&mut self, count: u32) -> Result<(), SeatError> {
        if self.seats_available < count {
            return Err(SeatError::NotEnoughSeats {
                requested: count,
                available: self.seats_available,
            });
        }
        self.seats_available -= count;
        Ok(())
    }

    /// Returns `count` seats.
    ///
    /// # Errors
    ///
    /// Returns [`SeatError::ExceedsCapacity`] when the counter would pass
    /// `max_attendees`.
    pub fn give_back_seats(&mut self, count: u32) -> Result<(), SeatError> {
        let exceeds = || SeatError::ExceedsCapacity {
            returned: count,
            available: self.seats_available,
            max_attendees: self.max_attendees,
        };
        let restored = self.seats_available.checked_add(count).ok_or_else(exceeds)?;
        if restored > self.max_attendees {
            return Err(exceeds());
        }
        self.seats_available = restored;
        Ok(())
    }
}

/// Month number of an optional date, 0 when absent
#[must_use]
pub fn month_of(date: Option<NaiveDate>) -> u32 {
    date.map_or(0, |d| d.month())
}

impl fmt::Display for Conference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Id: {}", self.key)?;
        writeln!(f, "Name: {}", self.name)?;
        if let Some(city) = &self.city {
            writeln!(f, "City: {city}")?;
        }
        if !self.topics.is_empty() {
            writeln!(f, "Topics: {}", self.topics.join(", "))?;
        }
        if let Some(start) = self.start_date {
            writeln!(f, "StartDate: {start}")?;
        }
        if let Some(end) = self.end_date {
            writeln!(f, "EndDate: {end}")?;
        }
        writeln!(f, "Max Attendees: {}", self.max_attendees)
    }
}

// ============================================================================
// Response wrappers
// ============================================================================

/// Boolean result with a human-readable reason
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedBoolean {
    /// Whether the operation succeeded
    pub result: bool,
    /// Explanation shown to the caller
    pub reason: String,
}

impl WrappedBoolean {
    /// Successful outcome
    #[must_use]
    pub fn success(reason: impl Into<String>) -> Self {
        Self {
            result: true,
            reason: reason.into(),
        }
    }

    /// Failed outcome
    #[must_use]
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            result: false,
            reason: reason.into(),
        }
    }
}

/// Cached announcement
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    /// Announcement text
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conference(max_attendees: u32) -> Conference {
        let key = ConferenceKey::new(UserId::new("organizer"), ConferenceId::new());
        Conference::from_form(
            key,
            ConferenceForm {
                name: Some("  RustConf ".to_string()),
                start_date: NaiveDate::from_ymd_opt(2026, 9, 8),
                max_attendees: Some(max_attendees),
                ..ConferenceForm::default()
            },
        )
    }

    #[test]
    fn websafe_key_survives_encoding() {
        let key = ConferenceKey::new(UserId::new("user:with:colons"), ConferenceId::new());
        let websafe = key.to_websafe();

        assert!(websafe.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(ConferenceKey::parse_websafe(&websafe), Ok(key));
    }

    #[test]
    fn garbage_keys_are_rejected() {
        assert!(ConferenceKey::parse_websafe("not base64!").is_err());
        assert!(ConferenceKey::parse_websafe(&URL_SAFE_NO_PAD.encode("no-separator")).is_err());
        assert!(ConferenceKey::parse_websafe(&URL_SAFE_NO_PAD.encode("not-a-uuid:user")).is_err());
        let missing_organizer = format!("{}:", Uuid::new_v4());
        assert!(ConferenceKey::parse_websafe(&URL_SAFE_NO_PAD.encode(missing_organizer)).is_err());
    }

    #[test]
    fn default_profile_uses_email_local_part() {
        let profile = Profile::new_default(&Identity::new("u1", "ada@example.com"));
        assert_eq!(profile.display_name, "ada");
        assert_eq!(profile.tee_shirt_size, TeeShirtSize::NotSpecified);
        assert!(profile.conference_keys_to_attend.is_empty());

        assert_eq!(default_display_name("no-at-sign"), "no-at-sign");
    }

    #[test]
    fn profile_form_only_touches_present_fields() {
        let mut profile = Profile::new_default(&Identity::new("u1", "ada@example.com"));
        profile.apply_form(ProfileForm {
            display_name: None,
            tee_shirt_size: Some(TeeShirtSize::Xl),
        });
        assert_eq!(profile.display_name, "ada");
        assert_eq!(profile.tee_shirt_size, TeeShirtSize::Xl);
    }

    #[test]
    fn conference_keys_stay_unique() {
        let mut profile = Profile::new_default(&Identity::new("u1", "ada@example.com"));
        let key = conference(1).key;
        profile.add_conference_key(key.clone());
        profile.add_conference_key(key.clone());
        assert_eq!(profile.conference_keys_to_attend.len(), 1);
        assert!(profile.remove_conference_key(&key));
        assert!(!profile.remove_conference_key(&key));
    }

    #[test]
    fn new_conference_derives_month_and_seats() {
        let conference = conference(25);
        assert_eq!(conference.name, "RustConf");
        assert_eq!(conference.month, 9);
        assert_eq!(conference.seats_available, 25);
        assert_eq!(month_of(None), 0);
    }

    #[test]
    fn seat_counter_stays_in_bounds() {
        let mut conference = conference(1);
        assert!(conference.give_back_seats(1).is_err());
        assert!(conference.book_seats(1).is_ok());
        assert_eq!(
            conference.book_seats(1),
            Err(SeatError::NotEnoughSeats { requested: 1, available: 0 })
        );
        assert!(conference.give_back_seats(1).is_ok());
        assert_eq!(conference.seats_available, 1);
    }

    #[test]
    fn form_validation() {
        let mut form = ConferenceForm::default();
        assert!(form.validate().is_err());

        form.name = Some("   ".to_string());
        assert!(form.validate().is_err());

        form.name = Some("EuroRust".to_string());
        form.start_date = NaiveDate::from_ymd_opt(2026, 10, 10);
        form.end_date = NaiveDate::from_ymd_opt(2026, 10, 9);
        assert!(form.validate().is_err());

        form.end_date = NaiveDate::from_ymd_opt(2026, 10, 11);
        assert!(form.validate().is_ok());
    }

    #[test]
    fn capacity_is_bounded_by_storable_range() {
        let mut form = ConferenceForm {
            name: Some("Huge".to_string()),
            max_attendees: Some(MAX_ATTENDEES_LIMIT),
            ..ConferenceForm::default()
        };
        assert!(form.validate().is_ok());
        assert_eq!(i32::try_from(MAX_ATTENDEES_LIMIT).ok(), Some(i32::MAX));

        form.max_attendees = Some(3_000_000_000);
        assert!(form
            .validate()
            .is_err_and(|error| error.contains("maxAttendees")));
    }

    #[test]
    fn shirt_sizes_use_screaming_case() {
        assert_eq!(
            serde_json::to_string(&TeeShirtSize::Xxxl).ok(),
            Some("\"XXXL\"".to_string())
        );
        assert_eq!("NOT_SPECIFIED".parse::<TeeShirtSize>(), Ok(TeeShirtSize::NotSpecified));
        assert!("HUGE".parse::<TeeShirtSize>().is_err());
    }

    #[test]
    fn conference_summary_lists_fields() {
        let summary = conference(10).to_string();
        assert!(summary.contains("Name: RustConf"));
        assert!(summary.contains("StartDate: 2026-09-08"));
        assert!(summary.contains("Max Attendees: 10"));
        assert!(!summary.contains("City:"));
    }
}
