use leptos::prelude::*;
use trajectory_core::{Locale, LocationGroup, VisitSummary, VisitType};

use crate::app::{Viewer, tr};

fn summary_line(summary: &VisitSummary, locale: Locale) -> String {
    let head = match locale {
        Locale::Zh => format!("共 {} 次到访", summary.total),
        Locale::En => format!("{} visits", summary.total),
    };
    let parts: Vec<String> = summary
        .parts()
        .into_iter()
        .map(|(ty, n)| format!("{n} {}", ty.label(locale)))
        .collect();
    if parts.is_empty() {
        head
    } else {
        format!("{head} ({})", parts.join(tr(locale, "，", ", ")))
    }
}

/// Visit history for one location, the way the map's detail modal shows it.
#[component]
fn DetailPanel(group: LocationGroup, locale: Locale, current: usize) -> impl IntoView {
    let viewer = expect_context::<Viewer>();
    let highlighted = move || viewer.state.with(|s| s.as_ref().and_then(|s| s.highlighted()));
    let summary = summary_line(&group.summary(), locale);

    let rows = group
        .visits_by_index()
        .into_iter()
        .enumerate()
        .map(|(n, visit)| {
            let index = visit.event_index;
            let class = format!("event-item {}-event", visit.visit_type.css_class());
            let description = if visit.visit_type == VisitType::Transit {
                format!("{}{}", tr(locale, "途经：", "Passing through: "), visit.event)
            } else {
                visit.event.clone()
            };
            view! {
                <li
                    class=class
                    class:current=index == current
                    class:highlighted=move || highlighted() == Some(index)
                    on:click=move |_| {
                        viewer.state.update(|s| {
                            if let Some(s) = s {
                                s.toggle_highlight(index);
                            }
                        });
                    }
                >
                    <div class="event-header">
                        <span class="visit-order-number">{n + 1}</span>
                        <span class="event-date-item">{visit.date.clone()}</span>
                        <span class="visit-order">{visit.label}</span>
                    </div>
                    <div class="event-description">{description}</div>
                    {visit.age.clone().map(|a| view! {
                        <div class="event-age">{tr(locale, "年龄 ", "Age ")} {a}</div>
                    })}
                </li>
            }
        })
        .collect_view();

    view! {
        <div class="card detail-panel">
            <h3>"📍 " {group.location.clone()}</h3>
            <p class="visit-summary">{summary}</p>
            <ul class="event-list">{rows}</ul>
        </div>
    }
}

#[component]
pub fn LocationsPage() -> impl IntoView {
    let viewer = expect_context::<Viewer>();
    let selected: RwSignal<Option<String>> = RwSignal::new(None);

    view! {
        <div>
            {move || match viewer.state.get() {
                None => view! { <p class="loading">"加载中… / Loading…"</p> }.into_any(),
                Some(state) => {
                    let locale = state.locale();
                    let current = state.current_index();
                    let groups = state.groups();
                    if groups.is_empty() {
                        return view! {
                            <p class="empty">{tr(locale, "尚无可定位的地点", "No mapped places yet")}</p>
                        }
                        .into_any();
                    }

                    let detail = selected
                        .get()
                        .and_then(|key| groups.iter().find(|g| g.key == key).cloned());

                    view! {
                        <div class="locations">
                            <ul class="location-list">
                                {groups.into_iter().map(|group| {
                                    let key = group.key.clone();
                                    let is_selected = selected.get().as_deref() == Some(key.as_str());
                                    let count = group.visits.len();
                                    view! {
                                        <li
                                            class="location-item"
                                            class:selected=is_selected
                                            class:current=group.contains_event(current)
                                            on:click=move |_| {
                                                if selected.get_untracked().as_deref() != Some(key.as_str()) {
                                                    viewer.state.update(|s| {
                                                        if let Some(s) = s {
                                                            s.clear_highlight();
                                                        }
                                                    });
                                                }
                                                selected.set(Some(key.clone()));
                                            }
                                        >
                                            <span class="location-name">{group.location.clone()}</span>
                                            <span class="location-count">{count}</span>
                                        </li>
                                    }
                                }).collect_view()}
                            </ul>
                            {detail.map(|group| view! {
                                <DetailPanel group=group locale=locale current=current/>
                            })}
                        </div>
                    }
                    .into_any()
                }
            }}
        </div>
    }
}
