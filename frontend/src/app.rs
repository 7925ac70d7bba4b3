use std::sync::Arc;

use leptos::logging::{error, log};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::{
    components::{A, Route, Router, Routes},
    path,
};
use trajectory_core::{
    AppState, CoordinateIndex, DataLayout, LoadSequence, Locale, load_index, load_trajectory,
};

use crate::pages::{locations::LocationsPage, timeline::TimelinePage};
use crate::source::HttpSource;

/// Pick the string for the active language.
pub fn tr(locale: Locale, zh: &'static str, en: &'static str) -> &'static str {
    match locale {
        Locale::Zh => zh,
        Locale::En => en,
    }
}

/// Starting language from the browser's preference list.
fn browser_locale() -> Locale {
    let navigator = window().navigator();
    let mut tags: Vec<String> = navigator
        .languages()
        .iter()
        .filter_map(|tag| tag.as_string())
        .collect();
    tags.extend(navigator.language());
    Locale::preferred(tags.iter().map(String::as_str))
}

/// Shared viewer state, provided as context to every page.
#[derive(Clone, Copy)]
pub struct Viewer {
    pub state: RwSignal<Option<AppState>>,
    pub error: RwSignal<Option<String>>,
    /// Language last asked for; may still be loading
    pub requested: RwSignal<Locale>,
    /// Built once, before the first dataset load
    index: StoredValue<Option<Arc<CoordinateIndex>>>,
    loads: StoredValue<LoadSequence>,
}

impl Viewer {
    fn new() -> Self {
        Viewer {
            state: RwSignal::new(None),
            error: RwSignal::new(None),
            requested: RwSignal::new(Locale::BASE),
            index: StoredValue::new(None),
            loads: StoredValue::new(LoadSequence::new()),
        }
    }

    /// Language of the dataset on screen.
    pub fn locale(&self) -> Locale {
        self.state
            .with(|s| s.as_ref().map(|s| s.locale()))
            .unwrap_or_else(|| self.requested.get())
    }

    /// Build the coordinate index, then load whichever language was
    /// requested by the time it is ready.
    fn start(self, locale: Locale) {
        self.requested.set(locale);
        spawn_local(async move {
            let index = load_index(&HttpSource, &DataLayout::default()).await;
            self.index.set_value(Some(Arc::new(index)));
            self.load(self.requested.get_untracked());
        });
    }

    /// Fetch and merge the dataset for `locale`. A load issued while an
    /// earlier one is still running wins; the earlier result is dropped.
    pub fn load(self, locale: Locale) {
        self.requested.set(locale);
        // picked up by `start` once the index is ready
        let Some(index) = self.index.get_value() else {
            return;
        };

        let mut loads = self.loads.get_value();
        let ticket = loads.begin(locale);
        self.loads.set_value(loads);

        spawn_local(async move {
            let result = load_trajectory(&HttpSource, &DataLayout::default(), locale, &index).await;

            let mut loads = self.loads.get_value();
            if !loads.finish(ticket) {
                log!("dropped stale {locale} load");
                return;
            }
            self.loads.set_value(loads);

            match result {
                Ok(dataset) => {
                    self.error.set(None);
                    self.state.update(|slot| match slot {
                        Some(state) => state.replace_dataset(dataset),
                        None => *slot = Some(AppState::new(dataset)),
                    });
                }
                Err(e) => {
                    error!("{e}");
                    self.error.set(Some(e.to_string()));
                }
            }
        });
    }
}

#[component]
fn LanguageSwitch() -> impl IntoView {
    let viewer = expect_context::<Viewer>();

    view! {
        <div class="lang-switch">
            {Locale::ALL.into_iter().map(|locale| {
                let active = move || viewer.requested.get() == locale;
                view! {
                    <button
                        class="lang-btn"
                        class:active=active
                        on:click=move |_| {
                            if viewer.requested.get_untracked() != locale {
                                viewer.load(locale);
                            }
                        }
                    >{locale.native_name()}</button>
                }
            }).collect_view()}
        </div>
    }
}

#[component]
pub fn App() -> impl IntoView {
    let viewer = Viewer::new();
    provide_context(viewer);
    viewer.start(browser_locale());

    let title = move || {
        viewer
            .state
            .with(|s| s.as_ref().map(|s| s.dataset().title.clone()))
            .unwrap_or_default()
    };

    view! {
        <Router>
            <div id="app">
                <header>
                    <h1>{title}</h1>
                    <nav>
                        <A href="/">{move || tr(viewer.locale(), "时间轴", "Timeline")}</A>
                        <A href="/locations">{move || tr(viewer.locale(), "地点", "Places")}</A>
                    </nav>
                    <LanguageSwitch/>
                </header>
                <main>
                    {move || viewer.error.get().map(|e| view! { <p class="error">{e}</p> })}
                    <Routes fallback=|| {
                        view! { <p class="error">"页面未找到 / Page not found"</p> }
                    }>
                        <Route path=path!("/") view=TimelinePage/>
                        <Route path=path!("/locations") view=LocationsPage/>
                    </Routes>
                </main>
            </div>
        </Router>
    }
}
