use leptos::prelude::*;
use log::warn;

/// 404 Not Found Page
#[component]
pub fn NotFound() -> impl IntoView {
	let path = web_sys::window().and_then(|w| w.location().pathname().ok()).unwrap_or_default();
	warn!("no route for {path}");

	view! {
		<div class="not-found">
			<h1>"Page not found"</h1>
			<p class="subtitle">{format!("Nothing lives at {path}.")}</p>
			<a href="/">"Back to the graph"</a>
		</div>
	}
}
