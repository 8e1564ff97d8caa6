//! Project route matching—maps an outgoing request's URL to configured projects.

// self
use crate::{_prelude::*, auth::ProjectId};

/// A static mapping entry tying a URL fragment to a project identity.
///
/// A route matches a request when its fragment occurs anywhere in the request's
/// URL. Fragments are plain substrings, not patterns; `/orders` matches both
/// `https://api.example.com/orders` and `https://api.example.com/v2/orders/123`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRoute {
	project: ProjectId,
	fragment: String,
}
impl ProjectRoute {
	/// Creates a route for the given project and URL fragment.
	pub fn new(project: ProjectId, fragment: impl Into<String>) -> Self {
		Self { project, fragment: fragment.into() }
	}

	/// Project identity this route maps to.
	pub fn project(&self) -> &ProjectId {
		&self.project
	}

	/// URL fragment this route matches on.
	pub fn fragment(&self) -> &str {
		&self.fragment
	}

	/// Whether the route matches the given target URL.
	pub fn matches(&self, target: &str) -> bool {
		target.contains(&self.fragment)
	}
}

/// Ordered set of project routes. Entries are not required to be mutually
/// exclusive; order is the configured order and is significant.
#[derive(Clone, Debug, Default)]
pub struct ProjectSet(Vec<ProjectRoute>);
impl ProjectSet {
	/// Creates a set from routes in configured order.
	pub fn new(routes: impl IntoIterator<Item = ProjectRoute>) -> Self {
		Self(routes.into_iter().collect())
	}

	/// Returns the first route matching the target URL, or `None`.
	pub fn first_match(&self, target: &str) -> Option<&ProjectRoute> {
		self.matches(target).next()
	}

	/// Iterates every route matching the target URL, in configured order.
	pub fn matches<'a, 'b>(
		&'a self,
		target: &'b str,
	) -> impl Iterator<Item = &'a ProjectRoute> + use<'a, 'b> {
		self.0.iter().filter(move |route| route.matches(target))
	}

	/// All configured routes.
	pub fn routes(&self) -> &[ProjectRoute] {
		&self.0
	}

	/// Whether the set holds no routes.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl FromIterator<ProjectRoute> for ProjectSet {
	fn from_iter<I: IntoIterator<Item = ProjectRoute>>(iter: I) -> Self {
		Self::new(iter)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn route(project: &str, fragment: &str) -> ProjectRoute {
		ProjectRoute::new(
			ProjectId::new(project).expect("Project fixture should be considered valid."),
			fragment,
		)
	}

	#[test]
	fn first_match_wins_in_configured_order() {
		let set = ProjectSet::new([route("ord-1", "/orders"), route("all", "/")]);
		let matched = set
			.first_match("https://api.example.com/orders/123")
			.expect("Order URL should match a route.");

		assert_eq!(matched.project().as_ref(), "ord-1");

		// Reversed order flips the winner; matching is order-sensitive.
		let set = ProjectSet::new([route("all", "/"), route("ord-1", "/orders")]);
		let matched = set
			.first_match("https://api.example.com/orders/123")
			.expect("Order URL should match a route.");

		assert_eq!(matched.project().as_ref(), "all");
	}

	#[test]
	fn unmatched_urls_yield_nothing() {
		let set = ProjectSet::new([route("ord-1", "/orders")]);

		assert!(set.first_match("https://api.example.com/users/7").is_none());
		assert_eq!(set.matches("https://api.example.com/users/7").count(), 0);
	}

	#[test]
	fn overlapping_routes_all_match() {
		let set = ProjectSet::new([route("ord-1", "/orders"), route("api-wide", "api.example")]);
		let matched: Vec<_> = set
			.matches("https://api.example.com/orders/123")
			.map(|route| route.project().as_ref())
			.collect();

		assert_eq!(matched, ["ord-1", "api-wide"]);
	}
}
