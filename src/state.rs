//! Local application state: favorite cities and the social run feed.
//!
//! The state lives alongside the session and is cleared by the gateway whenever a
//! forced sign-out occurs, since cached weather and feed entries belong to the
//! signed-in user.

// self
use crate::_prelude::*;

/// A city pinned to the dashboard with its last fetched weather.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteCity {
	/// Geocoding identifier, unique per city.
	pub id: u64,
	/// City name.
	pub name: String,
	/// First-level administrative area, when known.
	pub admin1: Option<String>,
	/// Country name, when known.
	pub country: Option<String>,
	/// Latitude in decimal degrees.
	pub latitude: f64,
	/// Longitude in decimal degrees.
	pub longitude: f64,
	/// Last fetched temperature, already formatted for display.
	pub temperature: String,
	/// Last fetched WMO weather code.
	pub weather_code: u16,
}

/// A comment attached to a feed post.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostComment {
	/// Commenting user, by username.
	pub username: String,
	/// Comment text.
	pub text: String,
	/// Instant the comment was added.
	pub date: OffsetDateTime,
}

/// A logged run shared on the social feed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
	/// Unique post identifier.
	pub id: String,
	/// Author username.
	pub username: String,
	/// Author display name.
	pub name: String,
	/// Author's city, when shared.
	pub city: Option<String>,
	/// Post text.
	pub text: String,
	/// Run distance in meters.
	pub distance: f64,
	/// Run duration.
	pub duration: RunDuration,
	/// Like count.
	pub likes: u32,
	/// Comments, oldest first.
	pub comments: Vec<PostComment>,
	/// Instant the run was logged.
	pub date: OffsetDateTime,
}
impl Post {
	/// Creates a post with no comments or likes, stamped with the current instant.
	pub fn new(
		id: impl Into<String>,
		username: impl Into<String>,
		name: impl Into<String>,
		text: impl Into<String>,
		distance: f64,
		duration: RunDuration,
	) -> Self {
		Self {
			id: id.into(),
			username: username.into(),
			name: name.into(),
			city: None,
			text: text.into(),
			distance,
			duration,
			likes: 0,
			comments: Vec::new(),
			date: OffsetDateTime::now_utc(),
		}
	}

	/// Attaches the author's city.
	pub fn with_city(mut self, city: impl Into<String>) -> Self {
		self.city = Some(city.into());

		self
	}

	/// Computes the pace over this post's distance, formatted `m:ss` per distance unit.
	///
	/// Returns `None` for a non-positive distance.
	pub fn pace(&self) -> Option<String> {
		self.duration.pace(self.distance)
	}
}

/// Errors produced when parsing a [`RunDuration`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum RunDurationError {
	/// The value did not match the `hh:mm:ss` shape.
	#[error("Run duration must use the hh:mm:ss format.")]
	InvalidFormat,
	/// A component exceeded its range (hours 0-23, minutes/seconds 0-59).
	#[error("Run duration component is out of range.")]
	OutOfRange,
}

/// A run duration in the feed's `hh:mm:ss` format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RunDuration(u32);
impl RunDuration {
	/// Builds a duration from hour, minute, and second components.
	pub fn new(hours: u8, minutes: u8, seconds: u8) -> Result<Self, RunDurationError> {
		if hours > 23 || minutes > 59 || seconds > 59 {
			return Err(RunDurationError::OutOfRange);
		}

		Ok(Self(u32::from(hours) * 3_600 + u32::from(minutes) * 60 + u32::from(seconds)))
	}

	/// Returns the total number of seconds.
	pub fn total_seconds(self) -> u32 {
		self.0
	}

	/// Computes the pace over `distance`, formatted `m:ss` per distance unit.
	///
	/// Returns `None` for a non-positive distance.
	pub fn pace(self, distance: f64) -> Option<String> {
		if distance <= 0. {
			return None;
		}

		let seconds_per_unit = f64::from(self.0) / distance;
		let minutes = (seconds_per_unit / 60.).floor() as u64;
		let seconds = (seconds_per_unit % 60.).round() as u64;

		Some(format!("{minutes}:{seconds:02}"))
	}
}
impl FromStr for RunDuration {
	type Err = RunDurationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let mut parts = s.split(':');
		let (Some(hours), Some(minutes), Some(seconds), None) =
			(parts.next(), parts.next(), parts.next(), parts.next())
		else {
			return Err(RunDurationError::InvalidFormat);
		};

		if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 || seconds.len() != 2 {
			return Err(RunDurationError::InvalidFormat);
		}

		let hours = hours.parse().map_err(|_| RunDurationError::InvalidFormat)?;
		let minutes = minutes.parse().map_err(|_| RunDurationError::InvalidFormat)?;
		let seconds = seconds.parse().map_err(|_| RunDurationError::InvalidFormat)?;

		Self::new(hours, minutes, seconds)
	}
}
impl TryFrom<String> for RunDuration {
	type Error = RunDurationError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}
impl From<RunDuration> for String {
	fn from(value: RunDuration) -> Self {
		value.to_string()
	}
}
impl Display for RunDuration {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{:02}:{:02}:{:02}", self.0 / 3_600, self.0 % 3_600 / 60, self.0 % 60)
	}
}

#[derive(Debug, Default)]
struct AppStateInner {
	favorite_cities: Vec<FavoriteCity>,
	posts: Vec<Post>,
}

/// Cloneable, thread-safe handle over the dashboard favorites and the social feed.
#[derive(Clone, Debug, Default)]
pub struct AppState(Arc<RwLock<AppStateInner>>);
impl AppState {
	/// Pins a city to the dashboard; duplicates (by id) are ignored.
	///
	/// Returns `true` if the city was added.
	pub fn add_city(&self, city: FavoriteCity) -> bool {
		let mut guard = self.0.write();

		if guard.favorite_cities.iter().any(|c| c.id == city.id) {
			return false;
		}

		guard.favorite_cities.push(city);

		true
	}

	/// Removes a pinned city by id.
	pub fn remove_city(&self, city_id: u64) {
		self.0.write().favorite_cities.retain(|c| c.id != city_id);
	}

	/// Updates the cached weather of a pinned city.
	pub fn update_city_weather(&self, city_id: u64, temperature: impl Into<String>, code: u16) {
		let mut guard = self.0.write();

		if let Some(city) = guard.favorite_cities.iter_mut().find(|c| c.id == city_id) {
			city.temperature = temperature.into();
			city.weather_code = code;
		}
	}

	/// Returns `true` if the city is pinned.
	pub fn contains_city(&self, city_id: u64) -> bool {
		self.0.read().favorite_cities.iter().any(|c| c.id == city_id)
	}

	/// Returns a snapshot of the pinned cities.
	pub fn favorite_cities(&self) -> Vec<FavoriteCity> {
		self.0.read().favorite_cities.clone()
	}

	/// Prepends a post to the feed (newest first).
	pub fn add_post(&self, post: Post) {
		self.0.write().posts.insert(0, post);
	}

	/// Appends a comment to the identified post.
	///
	/// Returns `false` if no such post exists.
	pub fn add_comment(&self, post_id: &str, comment: PostComment) -> bool {
		let mut guard = self.0.write();

		match guard.posts.iter_mut().find(|p| p.id == post_id) {
			Some(post) => {
				post.comments.push(comment);

				true
			},
			None => false,
		}
	}

	/// Increments the like count of the identified post.
	///
	/// Returns `false` if no such post exists.
	pub fn like_post(&self, post_id: &str) -> bool {
		let mut guard = self.0.write();

		match guard.posts.iter_mut().find(|p| p.id == post_id) {
			Some(post) => {
				post.likes += 1;

				true
			},
			None => false,
		}
	}

	/// Returns a snapshot of the feed, newest first.
	pub fn posts(&self) -> Vec<Post> {
		self.0.read().posts.clone()
	}

	/// Replaces the whole state, e.g. when restoring a persisted snapshot.
	pub fn restore(&self, favorite_cities: Vec<FavoriteCity>, posts: Vec<Post>) {
		*self.0.write() = AppStateInner { favorite_cities, posts };
	}

	/// Clears favorites and feed entries together.
	pub fn clear(&self) {
		*self.0.write() = AppStateInner::default();
	}
}
