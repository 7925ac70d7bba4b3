use leptos::prelude::*;
use trajectory_core::{AppState, ProcessedEvent};

use crate::app::{Viewer, tr};

fn place_line(ev: &ProcessedEvent) -> String {
    match (&ev.start_location, &ev.end_location) {
        (Some(s), Some(t)) if s != t => {
            let mut line = format!("{s} → {t}");
            if !ev.transit_locations.is_empty() {
                line.push_str(&format!(" ({})", ev.transit_locations.join(" · ")));
            }
            line
        }
        (_, Some(t)) => t.clone(),
        (Some(s), None) => s.clone(),
        (None, None) => String::new(),
    }
}

#[component]
fn EventCard(state: AppState) -> impl IntoView {
    let locale = state.locale();
    let Some(ev) = state.current_event().cloned() else {
        return view! { <p class="empty">{tr(locale, "暂无事件", "No events")}</p> }.into_any();
    };
    let total = state.dataset().len();
    let place = place_line(&ev);

    view! {
        <div class="card event-card">
            <div class="event-meta">
                <span class="event-index">{ev.index + 1} " / " {total}</span>
                <span class="event-time">{ev.raw.date.clone()}</span>
                <span class="event-type-badge">{ev.raw.movement_type.clone()}</span>
                {ev.raw.age.as_ref().map(|a| view! {
                    <span class="event-age">{tr(locale, "年龄 ", "Age ")} {a.to_string()}</span>
                })}
            </div>
            <div class="event-context">{ev.raw.event.clone()}</div>
            {(!place.is_empty()).then(|| view! {
                <div class="event-place">"📍 " {place}</div>
            })}
            {(!ev.is_plotted()).then(|| view! {
                <div class="event-source">{tr(locale, "该事件暂无坐标", "No coordinates for this event")}</div>
            })}
        </div>
    }
    .into_any()
}

#[component]
fn StatsGrid(state: AppState) -> impl IntoView {
    let locale = state.locale();
    let s = state.stats();
    let cards = [
        (s.shown_events, tr(locale, "已显示事件", "Events shown")),
        (s.total_events, tr(locale, "总事件数", "Total events")),
        (s.visited_locations, tr(locale, "到访地点", "Places visited")),
        (s.directed_moves, tr(locale, "迁移", "Moves")),
        (s.transit_stops, tr(locale, "途经", "Transit stops")),
    ];

    view! {
        <div class="stats-grid">
            {cards.into_iter().map(|(num, label)| view! {
                <div class="stat-card">
                    <div class="num">{num}</div>
                    <div class="label">{label}</div>
                </div>
            }).collect_view()}
        </div>
    }
}

#[component]
pub fn TimelinePage() -> impl IntoView {
    let viewer = expect_context::<Viewer>();
    let state = viewer.state;

    let show = move |i: usize| {
        state.update(|s| {
            if let Some(s) = s {
                s.show(i);
            }
        });
    };
    let step = move |forward: bool| {
        state.update(|s| {
            if let Some(s) = s {
                if forward {
                    s.step_forward();
                } else {
                    s.step_back();
                }
            }
        });
    };

    view! {
        <div>
            {move || match state.get() {
                None => view! { <p class="loading">"加载中… / Loading…"</p> }.into_any(),
                Some(s) => {
                    let locale = s.locale();
                    let max = s.dataset().last_index().unwrap_or(0);
                    let current = s.current_index();
                    let previous = s.previous_index();
                    view! {
                        <div>
                            <EventCard state=s.clone()/>
                            <div class="timeline-control">
                                <button on:click=move |_| step(false)>{tr(locale, "上一个", "Previous")}</button>
                                <input
                                    id="timeline-slider"
                                    type="range"
                                    min="0"
                                    max=max.to_string()
                                    prop:value=current.to_string()
                                    on:input=move |ev| {
                                        if let Ok(i) = event_target_value(&ev).parse::<usize>() {
                                            show(i);
                                        }
                                    }
                                />
                                <button on:click=move |_| step(true)>{tr(locale, "下一个", "Next")}</button>
                                {(previous != current).then(|| view! {
                                    <button class="jump-back" on:click=move |_| show(previous)>
                                        {tr(locale, "返回 #", "Back to #")} {previous + 1}
                                    </button>
                                })}
                            </div>
                            <StatsGrid state=s/>
                        </div>
                    }
                    .into_any()
                }
            }}
        </div>
    }
}
