use std::convert::Infallible;
use std::time::Duration;

use actix_web::{get, web, HttpResponse};
use chrono::Utc;
use futures::stream;
use tokio::sync::broadcast::{error::RecvError, Receiver};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::{app_state::AppState, models::dto::response::DashboardUpdate};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

fn sse_frame(update: &DashboardUpdate) -> web::Bytes {
    let json = serde_json::to_string(update).unwrap_or_else(|_| "{}".to_string());
    web::Bytes::from(format!("data: {}\n\n", json))
}

struct StreamState {
    receiver: Receiver<DashboardUpdate>,
    heartbeat: Interval,
    connected: bool,
}

/// Server-sent events feed for dashboards: a connection event on attach,
/// a heartbeat every 30 seconds, and broadcasts whenever an attempt lands.
#[get("/dashboard-updates")]
async fn dashboard_updates(state: web::Data<AppState>) -> HttpResponse {
    let receiver = state.updates.subscribe();
    log::info!(
        "New dashboard subscriber connected ({} total)",
        state.subscriber_count()
    );

    let mut heartbeat = interval_at(Instant::now() + HEARTBEAT_INTERVAL, HEARTBEAT_INTERVAL);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let events = stream::unfold(
        StreamState {
            receiver,
            heartbeat,
            connected: false,
        },
        |mut s| async move {
            if !s.connected {
                s.connected = true;
                let frame = sse_frame(&DashboardUpdate::Connection {
                    message: "Connected to real-time updates".to_string(),
                    timestamp: Utc::now().timestamp_millis(),
                });
                return Some((Ok::<_, Infallible>(frame), s));
            }

            loop {
                tokio::select! {
                    _ = s.heartbeat.tick() => {
                        let frame = sse_frame(&DashboardUpdate::Heartbeat {
                            timestamp: Utc::now().timestamp_millis(),
                        });
                        return Some((Ok(frame), s));
                    }
                    update = s.receiver.recv() => match update {
                        Ok(update) => return Some((Ok(sse_frame(&update)), s)),
                        Err(RecvError::Lagged(skipped)) => {
                            log::warn!("Dashboard subscriber lagged, skipped {} updates", skipped);
                            continue;
                        }
                        Err(RecvError::Closed) => return None,
                    },
                }
            }
        },
    );

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(events)
}
