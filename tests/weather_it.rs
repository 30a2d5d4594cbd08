#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use runcast_client::{
	error::Error,
	http::ReqwestTransport,
	url::Url,
	weather::WeatherClient,
};

fn build_client(server: &MockServer) -> WeatherClient<ReqwestTransport> {
	let forecast_url = Url::parse(&format!("{}/v1/forecast", server.base_url()))
		.expect("Mock forecast URL should parse successfully.");
	let geocoding_url = Url::parse(&format!("{}/v1/search", server.base_url()))
		.expect("Mock geocoding URL should parse successfully.");

	WeatherClient::with_endpoints(ReqwestTransport::default(), forecast_url, geocoding_url)
}

#[tokio::test]
async fn search_city_returns_the_provider_matches() {
	let server = MockServer::start_async().await;
	let client = build_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/search")
				.query_param("name", "Berlin")
				.query_param("count", "5")
				.query_param("language", "en")
				.query_param("format", "json");
			then.status(200).header("content-type", "application/json").body(
				"{\"results\":[\
				{\"id\":2950159,\"name\":\"Berlin\",\"admin1\":\"Land Berlin\",\
				\"country\":\"Germany\",\"latitude\":52.52437,\"longitude\":13.41053},\
				{\"id\":5083330,\"name\":\"Berlin\",\"admin1\":\"New Hampshire\",\
				\"country\":\"United States\",\"latitude\":44.46867,\"longitude\":-71.18508}\
				],\"generationtime_ms\":0.7}",
			);
		})
		.await;
	let matches = client.search_city("Berlin").await.expect("City search should succeed.");

	mock.assert_async().await;

	assert_eq!(matches.len(), 2);
	assert_eq!(matches[0].id, 2950159);
	assert_eq!(matches[0].admin1.as_deref(), Some("Land Berlin"));
	assert_eq!(matches[1].country.as_deref(), Some("United States"));
}

#[tokio::test]
async fn search_city_without_matches_yields_an_empty_list() {
	let server = MockServer::start_async().await;
	let client = build_client(&server);

	// The provider omits `results` entirely when nothing matches.
	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/search");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"generationtime_ms\":0.4}");
		})
		.await;

	let matches =
		client.search_city("Nowhereville").await.expect("An empty search should still succeed.");

	assert!(matches.is_empty());
}

#[tokio::test]
async fn current_weather_parses_the_forecast_variables() {
	let server = MockServer::start_async().await;
	let client = build_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/forecast")
				.query_param("latitude", "52.52")
				.query_param("longitude", "13.405")
				.query_param("forecast_days", "1")
				.query_param(
					"current",
					"temperature_2m,is_day,precipitation,rain,showers,weather_code,\
					wind_speed_10m",
				);
			then.status(200).header("content-type", "application/json").body(
				"{\"latitude\":52.52,\"longitude\":13.405,\"current\":{\
				\"time\":\"2026-08-27T09:00\",\"temperature_2m\":18.4,\"is_day\":1,\
				\"precipitation\":0.2,\"rain\":0.2,\"showers\":0.0,\"weather_code\":61,\
				\"wind_speed_10m\":11.3}}",
			);
		})
		.await;
	let current = client
		.current_weather(52.52, 13.405)
		.await
		.expect("Fetching the current weather should succeed.");

	mock.assert_async().await;

	assert_eq!(current.time, "2026-08-27T09:00");
	assert_eq!(current.temperature_2m, 18.4);
	assert_eq!(current.is_day, 1);
	assert_eq!(current.weather_code, 61);
	assert_eq!(current.wind_speed_10m, 11.3);
}

#[tokio::test]
async fn provider_failure_surfaces_without_touching_any_session() {
	let server = MockServer::start_async().await;
	let client = build_client(&server);

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/forecast");
			then.status(429)
				.header("content-type", "application/json")
				.body("{\"detail\":\"Rate limit exceeded\"}");
		})
		.await;

	let err = client
		.current_weather(52.52, 13.405)
		.await
		.expect_err("A provider rejection should surface as a failure.");

	match err {
		Error::Api { status, message } => {
			assert_eq!(status, 429);
			assert_eq!(message, "Rate limit exceeded");
		},
		other => panic!("Unexpected error variant: {other:?}"),
	}
}
