//! Open-Meteo geocoding and current-weather client.
//!
//! The weather provider is an opaque external collaborator: calls are never
//! authenticated, and failures are surfaced to the caller without ever touching the
//! session. The client shares the crate's [`ApiTransport`] seam so tests can point it
//! at a mock server.

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	gateway::GENERIC_FAILURE,
	http::{ApiCall, ApiTransport, Method},
	obs::{self, CallKind, CallOutcome, CallSpan},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Maximum number of matches returned by a city search.
pub const SEARCH_RESULT_COUNT: u8 = 5;

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
const CURRENT_VARIABLES: &str =
	"temperature_2m,is_day,precipitation,rain,showers,weather_code,wind_speed_10m";

#[cfg(feature = "reqwest")]
/// Weather client specialized for the crate's default reqwest transport stack.
pub type ReqwestWeatherClient = WeatherClient<ReqwestTransport>;

/// A geocoding match for a city search.
#[derive(Clone, Debug, Deserialize)]
pub struct CityMatch {
	/// Geocoding identifier, unique per city.
	pub id: u64,
	/// City name.
	pub name: String,
	/// First-level administrative area, when known.
	#[serde(default)]
	pub admin1: Option<String>,
	/// Country name, when known.
	#[serde(default)]
	pub country: Option<String>,
	/// Latitude in decimal degrees.
	pub latitude: f64,
	/// Longitude in decimal degrees.
	pub longitude: f64,
}

#[derive(Debug, Deserialize)]
struct GeocodingResults {
	// The provider omits the field entirely when nothing matches.
	#[serde(default)]
	results: Option<Vec<CityMatch>>,
}

/// Current weather variables for one location.
#[derive(Clone, Debug, Deserialize)]
pub struct CurrentWeather {
	/// Provider timestamp for the observation.
	pub time: String,
	/// Air temperature at 2 m, in degrees Celsius.
	pub temperature_2m: f64,
	/// 1 during daylight, 0 otherwise.
	pub is_day: u8,
	/// Total precipitation, in millimeters.
	pub precipitation: f64,
	/// Rainfall, in millimeters.
	pub rain: f64,
	/// Showers, in millimeters.
	pub showers: f64,
	/// WMO weather interpretation code.
	pub weather_code: u16,
	/// Wind speed at 10 m, in km/h.
	pub wind_speed_10m: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
	current: CurrentWeather,
}

/// Client for the Open-Meteo forecast and geocoding APIs.
#[derive(Clone, Debug)]
pub struct WeatherClient<T>
where
	T: ?Sized + ApiTransport,
{
	transport: Arc<T>,
	forecast_url: Url,
	geocoding_url: Url,
}
impl<T> WeatherClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates a client against custom provider endpoints (e.g. a mock server).
	pub fn with_endpoints(
		transport: impl Into<Arc<T>>,
		forecast_url: Url,
		geocoding_url: Url,
	) -> Self {
		Self { transport: transport.into(), forecast_url, geocoding_url }
	}

	/// Searches for cities by name, returning up to [`SEARCH_RESULT_COUNT`] matches.
	pub async fn search_city(&self, city: &str) -> Result<Vec<CityMatch>> {
		const KIND: CallKind = CallKind::Weather;

		let span = CallSpan::new(KIND, "search_city");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let response =
					self.transport.execute(ApiCall::new(Method::Get, self.search_url(city))).await?;

				if !response.is_success() {
					return Err(Error::Api {
						status: response.status,
						message: response.detail().unwrap_or_else(|| GENERIC_FAILURE.into()),
					});
				}

				let parsed: GeocodingResults = response.json()?;

				Ok(parsed.results.unwrap_or_default())
			})
			.await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	/// Fetches the current weather for a coordinate pair.
	pub async fn current_weather(&self, latitude: f64, longitude: f64) -> Result<CurrentWeather> {
		const KIND: CallKind = CallKind::Weather;

		let span = CallSpan::new(KIND, "current_weather");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let url = self.forecast_url_for(latitude, longitude);
				let response = self.transport.execute(ApiCall::new(Method::Get, url)).await?;

				if !response.is_success() {
					return Err(Error::Api {
						status: response.status,
						message: response.detail().unwrap_or_else(|| GENERIC_FAILURE.into()),
					});
				}

				let parsed: ForecastResponse = response.json()?;

				Ok(parsed.current)
			})
			.await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	fn search_url(&self, city: &str) -> Url {
		let mut url = self.geocoding_url.clone();

		url.query_pairs_mut()
			.append_pair("name", city)
			.append_pair("count", &SEARCH_RESULT_COUNT.to_string())
			.append_pair("language", "en")
			.append_pair("format", "json");

		url
	}

	fn forecast_url_for(&self, latitude: f64, longitude: f64) -> Url {
		let mut url = self.forecast_url.clone();

		url.query_pairs_mut()
			.append_pair("latitude", &latitude.to_string())
			.append_pair("longitude", &longitude.to_string())
			.append_pair("current", CURRENT_VARIABLES)
			.append_pair("forecast_days", "1");

		url
	}
}
#[cfg(feature = "reqwest")]
impl WeatherClient<ReqwestTransport> {
	/// Creates a client against the public Open-Meteo endpoints.
	pub fn new() -> Result<Self, ConfigError> {
		Ok(Self::with_endpoints(
			ReqwestTransport::default(),
			Url::parse(FORECAST_URL)?,
			Url::parse(GEOCODING_URL)?,
		))
	}
}
