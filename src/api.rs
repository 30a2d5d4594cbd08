//! Typed operations against the RunCast backend.
//!
//! Each operation funnels through [`Gateway::send`], so bearer attachment, failure
//! classification, and single-flight credential recovery apply uniformly. Payload
//! models mirror the backend's camelCase wire format.

// self
use crate::{
	_prelude::*,
	error::{ProtocolError, parse_value},
	gateway::{ApiRequest, ApiResponse, Gateway},
	http::ApiTransport,
	session::{TokenSecret, User},
};

/// Registration form fields submitted by the sign-up wizard.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterFields {
	/// Display name.
	pub name: String,
	/// Phone number used for OTP verification.
	pub phone_number: String,
	/// Email address used for sign-in.
	pub email: String,
	/// Account password.
	pub password: String,
	/// Home country.
	pub country: String,
	/// Home city.
	pub city: String,
	/// Lowest temperature the user still runs at, in degrees Celsius.
	pub min_temperature: i32,
	/// Highest temperature the user still runs at, in degrees Celsius.
	pub max_temperature: i32,
	/// Running-day mask as entered in the form, one digit per weekday.
	pub week_days_running: String,
	/// Whether to notify via SMS.
	#[serde(rename = "noteBySMS")]
	pub note_by_sms: bool,
	/// Whether to notify via WhatsApp.
	#[serde(rename = "noteByWhatsapp")]
	pub note_by_whatsapp: bool,
	/// Whether to notify via email.
	pub note_by_email: bool,
}

/// Per-weekday running mask exchanged with the backend as a single integer of
/// concatenated digits (the original client collapses `[1,1,0,1,1,0,0]` to `1101100`).
///
/// The collapsed form drops leading zero days; this mirrors the backend contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u64", into = "u64")]
pub struct WeekDays(Vec<u8>);
impl WeekDays {
	/// Wraps a per-weekday digit list.
	pub fn new(days: impl Into<Vec<u8>>) -> Self {
		Self(days.into())
	}

	/// Returns the per-weekday digits.
	pub fn days(&self) -> &[u8] {
		&self.0
	}

	fn collapse(&self) -> u64 {
		self.0.iter().fold(0, |acc, day| acc * 10 + u64::from(*day % 10))
	}
}
impl From<u64> for WeekDays {
	fn from(collapsed: u64) -> Self {
		if collapsed == 0 {
			return Self(vec![0]);
		}

		let mut digits = Vec::new();
		let mut rest = collapsed;

		while rest > 0 {
			digits.push((rest % 10) as u8);
			rest /= 10;
		}

		digits.reverse();

		Self(digits)
	}
}
impl From<WeekDays> for u64 {
	fn from(days: WeekDays) -> Self {
		days.collapse()
	}
}

/// User settings payload served by `GET /get_user_details` and accepted by
/// `PUT /update_user_details`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
	/// Display name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Email address.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Phone number.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub phone_number: Option<String>,
	/// Home city.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub city: Option<String>,
	/// Home country.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub country: Option<String>,
	/// Lowest temperature the user still runs at, in degrees Celsius.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub min_temperature: Option<i32>,
	/// Highest temperature the user still runs at, in degrees Celsius.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_temperature: Option<i32>,
	/// Per-weekday running mask.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub week_days_running: Option<WeekDays>,
	/// Whether to notify via email.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub note_by_email: Option<bool>,
	/// Whether to notify via WhatsApp.
	#[serde(rename = "noteByWhatsapp", skip_serializing_if = "Option::is_none")]
	pub note_by_whatsapp: Option<bool>,
	/// Whether to notify via SMS.
	#[serde(rename = "noteBySMS", skip_serializing_if = "Option::is_none")]
	pub note_by_sms: Option<bool>,
}

/// Body of a successful login response.
#[derive(Debug, Deserialize)]
struct LoginPayload {
	access_token: String,
	refresh_token: String,
	user: User,
}

impl<T> Gateway<T>
where
	T: ?Sized + ApiTransport,
{
	/// Signs in with email and password, installing the returned session.
	pub async fn login(&self, email: &str, password: &str) -> Result<ApiResponse> {
		let body = serde_json::json!({ "email": email, "password": password });
		let response = self.send(ApiRequest::post("/login", body)).await?;
		let payload: LoginPayload = parse_value(response.data.clone(), Some(200))?;

		self.session().sign_in(
			payload.user,
			TokenSecret::new(payload.access_token),
			Some(TokenSecret::new(payload.refresh_token)),
		);

		Ok(response)
	}

	/// Registers a new account.
	pub async fn register(&self, fields: &RegisterFields) -> Result<ApiResponse> {
		let body = serde_json::to_value(fields).map_err(ProtocolError::from)?;

		self.send(ApiRequest::post("/register", body)).await
	}

	/// Requests a one-time password for the provided phone number.
	pub async fn request_otp(&self, phone_number: &str) -> Result<ApiResponse> {
		let body = serde_json::json!({ "phone_number": phone_number });

		self.send(ApiRequest::post("/request-otp", body)).await
	}

	/// Verifies a one-time password.
	pub async fn verify_otp(&self, phone_number: &str, code: &str) -> Result<ApiResponse> {
		let body = serde_json::json!({ "phone_number": phone_number, "otp": code });

		self.send(ApiRequest::post("/verify-otp", body)).await
	}

	/// Fetches the signed-in user's settings.
	pub async fn get_user_details(&self) -> Result<UserSettings> {
		let response = self.send(ApiRequest::get("/get_user_details")).await?;

		Ok(parse_value(response.data, Some(200))?)
	}

	/// Updates the signed-in user's settings.
	pub async fn update_user_details(&self, settings: &UserSettings) -> Result<ApiResponse> {
		let body = serde_json::to_value(settings).map_err(ProtocolError::from)?;

		self.send(ApiRequest::put("/update_user_details", body)).await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn week_days_collapse_to_concatenated_digits() {
		let days = WeekDays::new([1, 1, 0, 1, 1, 0, 0]);

		assert_eq!(u64::from(days.clone()), 1101100);

		let value = serde_json::to_value(&days).expect("Week days should serialize to a number.");

		assert_eq!(value, serde_json::json!(1101100));
	}

	#[test]
	fn week_days_restore_from_number_drops_leading_zero_days() {
		let days: WeekDays = serde_json::from_value(serde_json::json!(111101))
			.expect("Week days should deserialize from a number.");

		// A leading rest-day digit is lost in the collapsed form.
		assert_eq!(days.days(), &[1, 1, 1, 1, 0, 1]);

		let none: WeekDays = serde_json::from_value(serde_json::json!(0))
			.expect("An all-rest mask should deserialize.");

		assert_eq!(none.days(), &[0]);
	}

	#[test]
	fn register_fields_use_backend_field_names() {
		let fields = RegisterFields {
			name: "Ada".into(),
			phone_number: "+4915200000000".into(),
			email: "ada@example.com".into(),
			password: "hunter2".into(),
			country: "Germany".into(),
			city: "Berlin".into(),
			min_temperature: 5,
			max_temperature: 28,
			week_days_running: "1111100".into(),
			note_by_sms: true,
			note_by_whatsapp: false,
			note_by_email: false,
		};
		let value =
			serde_json::to_value(&fields).expect("Register fields should serialize to JSON.");

		assert_eq!(value["phoneNumber"], "+4915200000000");
		assert_eq!(value["weekDaysRunning"], "1111100");
		assert_eq!(value["noteBySMS"], true);
		assert_eq!(value["noteByWhatsapp"], false);
		assert_eq!(value["noteByEmail"], false);
	}

	#[test]
	fn settings_round_trip_with_collapsed_week_days() {
		let payload = serde_json::json!({
			"name": "Ada",
			"city": "Berlin",
			"minTemperature": 5,
			"maxTemperature": 28,
			"weekDaysRunning": 1111100,
			"noteBySMS": true,
		});
		let settings: UserSettings = serde_json::from_value(payload)
			.expect("Settings payload should deserialize successfully.");

		assert_eq!(settings.week_days_running.as_ref().map(WeekDays::days), Some(&[1, 1, 1, 1, 1, 0, 0][..]));
		assert_eq!(settings.note_by_sms, Some(true));
		assert_eq!(settings.email, None);

		let serialized =
			serde_json::to_value(&settings).expect("Settings should serialize back to JSON.");

		assert_eq!(serialized["weekDaysRunning"], 1111100);
		assert!(serialized.get("email").is_none(), "Unset fields must be omitted.");
	}
}
