/// Popup UI for the utubext extension

use patternfly_yew::prelude::*;
use serde::Deserialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::analysis::{Analysis, AnalysisRecord};
use crate::config::AppConfig;
use crate::filter::FilterState;
use crate::metadata::{ProbeResponse, VideoMetadata, is_watch_page};
use crate::session::Session;
use crate::ui::components::{AnalysisCard, FilterPanel, HistoryItem, ScriptSection};

// Import JS bridge functions
#[wasm_bindgen(module = "/popup.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getActiveTab() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn requestVideoMetadata(tab_id: i32) -> Result<JsValue, JsValue>;

    fn scrollToTop();
}

#[derive(Debug, Deserialize)]
struct ActiveTab {
    id: i32,
    url: Option<String>,
}

#[derive(Clone, PartialEq)]
enum LoadingState {
    Idle,
    Searching,
    Completed,
    Error(String),
}

#[function_component(App)]
pub fn app() -> Html {
    let session = use_memo((), |_| Session::from_config(&AppConfig::from_build_env()));
    let topic = use_state(String::new);
    let metadata = use_state(|| None::<VideoMetadata>);
    let result = use_state(|| None::<Analysis>);
    let history = use_state(Vec::<AnalysisRecord>::new);
    let filters = use_state(FilterState::default);
    let loading = use_state(|| LoadingState::Idle);

    // Probe the active tab and load history on mount
    {
        let session = session.clone();
        let topic = topic.clone();
        let metadata = metadata.clone();
        let history = history.clone();

        use_effect_with((), move |_| {
            spawn_local(async move {
                if let Some(video) = probe_active_video().await {
                    topic.set(video.title.clone());
                    metadata.set(Some(video));
                }
            });
            spawn_local(async move {
                history.set(session.history().await);
            });
            || ()
        });
    }

    let on_topic_input = {
        let topic = topic.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                topic.set(input.value());
            }
        })
    };

    let is_searching = *loading == LoadingState::Searching;

    let on_submit = {
        let session = session.clone();
        let topic = topic.clone();
        let metadata = metadata.clone();
        let result = result.clone();
        let history = history.clone();
        let filters = filters.clone();
        let loading = loading.clone();

        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            if topic.trim().is_empty() || is_searching {
                return;
            }

            loading.set(LoadingState::Searching);
            result.set(None);

            let session = session.clone();
            let topic = (*topic).clone();
            let video = (*metadata).clone();
            let current_filters = *filters;
            let result = result.clone();
            let history = history.clone();
            let loading = loading.clone();

            spawn_local(async move {
                match session.analyze(&topic, video.as_ref(), &current_filters).await {
                    Ok(analysis) => {
                        loading.set(LoadingState::Completed);
                        result.set(Some(analysis.clone()));

                        spawn_local(async move {
                            session.record(&analysis).await;
                            history.set(session.history().await);
                        });
                    }
                    Err(e) => {
                        log::error!("utubext: analysis failed: {}", e);
                        loading.set(LoadingState::Error(e.user_message().to_string()));
                    }
                }
            });
        })
    };

    let on_filters_change = {
        let filters = filters.clone();
        Callback::from(move |state: FilterState| filters.set(state))
    };

    let on_open_record = {
        let result = result.clone();
        Callback::from(move |record: AnalysisRecord| {
            result.set(Some(record.analysis));
            scrollToTop();
        })
    };

    let on_back = {
        let result = result.clone();
        Callback::from(move |_: MouseEvent| result.set(None))
    };

    let visible = filters.apply(&history);

    html! {
        <div class="popup">
            <div class="status-bar">
                <span>{"ENGINE: ONLINE"}</span>
                <span>{"FILTERS ACTIVE"}</span>
            </div>

            <header class="popup-header">
                <div class="brand-row">
                    <h1 class="popup-title">{"UTUBE"}<span class="popup-title-accent">{"EXT"}</span></h1>
                    if metadata.is_some() {
                        <span class="live-detect">{"Live detect"}</span>
                    }
                </div>

                <form class="search-form" onsubmit={on_submit}>
                    <input
                        type="text"
                        placeholder="Topic or keyword..."
                        class="search-input"
                        value={(*topic).clone()}
                        oninput={on_topic_input}
                        disabled={is_searching}
                    />
                    <button
                        type="submit"
                        class="search-button"
                        disabled={is_searching || topic.trim().is_empty()}
                    >
                        {"SCAN"}
                    </button>
                </form>

                <FilterPanel state={*filters} on_change={on_filters_change} />
            </header>

            <main class="popup-main">
                {match &*loading {
                    LoadingState::Searching => html! {
                        <div class="loading-text-center">
                            <Spinner />
                            <p class="loading-text">{"Running market analysis..."}</p>
                        </div>
                    },
                    LoadingState::Error(message) => html! {
                        <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                            {message.clone()}
                        </Alert>
                    },
                    LoadingState::Idle | LoadingState::Completed => html! {},
                }}

                if let Some(analysis) = (*result).clone() {
                    <div class="result-view">
                        <div class="result-header">
                            <h2 class="result-title">{&analysis.title}</h2>
                            <p class="result-summary">{&analysis.summary}</p>
                        </div>
                        <AnalysisCard analysis={analysis.clone()} />
                        <ScriptSection analysis={analysis} />
                        <Button onclick={on_back} variant={ButtonVariant::Secondary} block={true}>
                            {"← BACK TO VAULT"}
                        </Button>
                    </div>
                } else if !is_searching && !history.is_empty() {
                    <div class="history">
                        <h3 class="history-heading">{"Analysis History"}</h3>
                        {for visible.iter().map(|record| html! {
                            <HistoryItem
                                key={record.id.clone()}
                                record={record.clone()}
                                on_open={on_open_record.clone()}
                            />
                        })}
                        if visible.is_empty() {
                            <div class="empty-state">
                                <p>{"No records match the filters"}</p>
                            </div>
                        }
                    </div>
                }
            </main>

            <p class="footer-popup">
                {"utubext opportunity architect"}
            </p>
        </div>
    }
}

// Helper functions

/// Metadata of the active tab when it is a video page; None otherwise
async fn probe_active_video() -> Option<VideoMetadata> {
    let tab: ActiveTab = match getActiveTab().await {
        Ok(tab_js) if !tab_js.is_null() && !tab_js.is_undefined() => serde_wasm_bindgen::from_value(tab_js)
            .map_err(|e| log::warn!("utubext: unreadable tab info: {:?}", e))
            .ok()?,
        Ok(_) => return None,
        Err(e) => {
            log::warn!("utubext: extension API access limited: {:?}", e);
            return None;
        }
    };

    if !tab.url.as_deref().is_some_and(is_watch_page) {
        return None;
    }

    match requestVideoMetadata(tab.id).await {
        Ok(response_js) if !response_js.is_null() && !response_js.is_undefined() => {
            let response: ProbeResponse = serde_wasm_bindgen::from_value(response_js)
                .map_err(|e| log::warn!("utubext: unreadable page metadata: {:?}", e))
                .ok()?;
            VideoMetadata::from_probe(response)
        }
        Ok(_) => None,
        Err(e) => {
            log::warn!("utubext: metadata probe failed: {:?}", e);
            None
        }
    }
}
