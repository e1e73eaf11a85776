/// Reusable UI components for the analysis views

use patternfly_yew::prelude::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

use crate::analysis::{Analysis, AnalysisRecord, CompetitionLevel};
use crate::filter::{CompetitionTarget, FilterState, ViewFilter, is_high_yield};

#[wasm_bindgen(module = "/popup.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn copyToClipboard(text: &str) -> Result<(), JsValue>;
}

/// How long the "Copied" label stays up
const COPIED_RESET_MS: i32 = 2000;

#[derive(Properties, PartialEq)]
pub struct AnalysisProps {
    pub analysis: Analysis,
}

#[function_component(AnalysisCard)]
pub fn analysis_card(props: &AnalysisProps) -> Html {
    let analysis = &props.analysis;
    let level = analysis.competition_level;

    let level_class = if level == CompetitionLevel::Low { "saturation-level low" } else { "saturation-level" };
    let bar_class = match level {
        CompetitionLevel::Low => "saturation-fill low",
        CompetitionLevel::Medium => "saturation-fill medium",
        CompetitionLevel::High => "saturation-fill high",
    };

    html! {
        <div class="analysis-card">
            if analysis.is_high_yield() {
                <div class="high-yield-banner">{"💎 High-Yield Opportunity Detected"}</div>
            }

            <div class="metric-row">
                <div class="metric-box">
                    <h3 class="metric-title">{"Momentum"}</h3>
                    <div class={classes!("metric-score", analysis.trend_tier().css_class())}>
                        {format!("%{}", analysis.trend_score)}
                    </div>
                </div>

                <div class="metric-box">
                    <h3 class="metric-title">{"Saturation"}</h3>
                    <div class={level_class}>{level.label()}</div>
                    <div class="saturation-track">
                        <div
                            class={bar_class}
                            style={format!("width: {}%;", level.saturation_percent())}
                        ></div>
                    </div>
                </div>
            </div>

            <div class="metric-box">
                <h3 class="metric-title">{"Arbitrage Keywords"}</h3>
                <div class="keyword-list">
                    {for analysis.top_keywords.iter().map(|keyword| html! {
                        <span class="keyword">{keyword}</span>
                    })}
                </div>
            </div>
        </div>
    }
}

#[function_component(ScriptSection)]
pub fn script_section(props: &AnalysisProps) -> Html {
    let analysis = &props.analysis;
    let copied = use_state(|| false);

    let on_copy = {
        let copied = copied.clone();
        let prompt = analysis.full_script_prompt.clone();

        Callback::from(move |_: MouseEvent| {
            let copied = copied.clone();
            let prompt = prompt.clone();

            spawn_local(async move {
                match copyToClipboard(&prompt).await {
                    Ok(_) => {
                        copied.set(true);
                        reset_after(COPIED_RESET_MS, move || copied.set(false));
                    }
                    Err(e) => {
                        log::warn!("utubext: clipboard write failed: {:?}", e);
                    }
                }
            });
        })
    };

    html! {
        <div class="script-section">
            <div class="section-box">
                <h3 class="section-title titles">{"Viral UK Titles (CTR Optimized)"}</h3>
                <ul class="title-list">
                    {for analysis.suggested_titles.iter().enumerate().map(|(i, title)| html! {
                        <li class="title-item">
                            <span class="title-index">{format!("{}.", i + 1)}</span>
                            <p class="title-text">{title}</p>
                        </li>
                    })}
                </ul>
            </div>

            <div class="section-box">
                <h3 class="section-title hooks">{"Audience Retention Hooks"}</h3>
                {for analysis.viral_hooks.iter().map(|hook| html! {
                    <div class="hook">{format!("\"{}\"", hook)}</div>
                })}
            </div>

            <div class="prompt-box">
                <div class="prompt-header">
                    <h3 class="prompt-title">{"SCRIPT ARCHITECTURE"}</h3>
                    <Button onclick={on_copy} variant={ButtonVariant::Primary}>
                        {if *copied { "COPIED" } else { "COPY PROMPT" }}
                    </Button>
                </div>
                <div class="prompt-body">{&analysis.full_script_prompt}</div>
            </div>

            if !analysis.sources.is_empty() {
                <div class="sources">
                    <h4 class="sources-title">{"Verified Sources"}</h4>
                    <div class="sources-grid">
                        {for analysis.sources.iter().map(|source| html! {
                            <a
                                class="source-link"
                                href={source.uri.clone()}
                                target="_blank"
                                rel="noopener noreferrer"
                            >
                                <span class="source-title">{&source.title}</span>
                                <span class="source-uri">{&source.uri}</span>
                            </a>
                        })}
                    </div>
                </div>
            }
        </div>
    }
}

/// Run `f` once after `ms` milliseconds
fn reset_after(ms: i32, f: impl FnOnce() + 'static) {
    let Some(window) = web_sys::window() else {
        return;
    };

    let closure = Closure::once_into_js(f);
    if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(closure.unchecked_ref(), ms) {
        log::warn!("utubext: setTimeout failed: {:?}", e);
    }
}

#[derive(Properties, PartialEq)]
pub struct HistoryItemProps {
    pub record: AnalysisRecord,
    pub on_open: Callback<AnalysisRecord>,
}

#[function_component(HistoryItem)]
pub fn history_item(props: &HistoryItemProps) -> Html {
    let record = &props.record;
    let analysis = &record.analysis;
    let high_yield = is_high_yield(record);

    let onclick = props.on_open.reform({
        let record = record.clone();
        move |_: MouseEvent| record.clone()
    });

    let level_badge = if analysis.competition_level == CompetitionLevel::Low {
        "level-badge low"
    } else {
        "level-badge"
    };

    html! {
        <button class={classes!("history-item", high_yield.then_some("high-yield"))} {onclick}>
            <div class="history-content">
                <div class="history-title-row">
                    <h4 class="history-title">{&analysis.title}</h4>
                    if high_yield {
                        <span class="high-yield-marker">{"💎"}</span>
                    }
                </div>
                <div class="history-meta">
                    <span class={level_badge}>{format!("{} competition", analysis.competition_level)}</span>
                    <span class="history-trend">{format!("Trend: %{}", analysis.trend_score)}</span>
                </div>
            </div>
            <div class={classes!("history-score", high_yield.then_some("high-yield"))}>
                {format!("%{}", analysis.trend_score)}
            </div>
        </button>
    }
}

#[derive(Properties, PartialEq)]
pub struct FilterPanelProps {
    pub state: FilterState,
    pub on_change: Callback<FilterState>,
}

#[function_component(FilterPanel)]
pub fn filter_panel(props: &FilterPanelProps) -> Html {
    let state = props.state;

    let on_trend_input = {
        let on_change = props.on_change.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                if let Ok(value) = input.value().parse::<u8>() {
                    on_change.emit(state.with_min_trend(value));
                }
            }
        })
    };

    let on_target_change = {
        let on_change = props.on_change.clone();
        Callback::from(move |e: Event| {
            if let Some(select) = e.target_dyn_into::<HtmlSelectElement>() {
                if let Some(target) = CompetitionTarget::parse(&select.value()) {
                    on_change.emit(state.with_target(target));
                }
            }
        })
    };

    let on_preset = |filter: ViewFilter| {
        let on_change = props.on_change.clone();
        Callback::from(move |_: MouseEvent| on_change.emit(state.select(filter)))
    };

    let targets = std::iter::once(CompetitionTarget::All)
        .chain(CompetitionLevel::ALL.into_iter().map(CompetitionTarget::Only));

    html! {
        <div class="filter-panel">
            <div class="threshold-grid">
                <div class="threshold-box">
                    <div class="threshold-header">
                        <label class="threshold-label">{"Min Trend"}</label>
                        <span class="threshold-value">{format!("%{}", state.min_trend)}</span>
                    </div>
                    <input
                        type="range"
                        min="0"
                        max="100"
                        value={state.min_trend.to_string()}
                        oninput={on_trend_input}
                        class="threshold-slider"
                    />
                </div>

                <div class="threshold-box">
                    <label class="threshold-label">{"Competition Limit"}</label>
                    <select class="threshold-select" onchange={on_target_change}>
                        {for targets.map(|target| html! {
                            <option value={target.as_value()} selected={target == state.target}>
                                {if target == CompetitionTarget::All { "All" } else { target.as_value() }}
                            </option>
                        })}
                    </select>
                </div>
            </div>

            <div class="preset-row">
                {for ViewFilter::PRESETS.into_iter().map(|filter| {
                    let class = if state.filter == filter { "preset-button active" } else { "preset-button" };
                    html! {
                        <button class={class} onclick={on_preset(filter)}>{filter.label()}</button>
                    }
                })}
            </div>
        </div>
    }
}
