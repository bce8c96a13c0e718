use std::net::{Ipv4Addr, TcpListener};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use memory::Board;
use tracing::{debug, error, info};

use crate::request::is_valid_player_id;
use crate::session::wait_for_change;

/// Serves one board over HTTP for browser clients.
///
/// Every route names the player in its path, and unknown players are
/// registered on their first request. Replies are the structured view of
/// [`memory::BoardState`] as plain text:
///
/// - `GET /look/<player>`
/// - `GET /flip/<player>/<column>,<row>`
/// - `GET /watch/<player>`
pub struct WebServer {
    listener: TcpListener,
    board: Arc<Board>,
    watch_timeout: Option<Duration>,
}

#[derive(Clone)]
struct AppState {
    board: Arc<Board>,
    watch_timeout: Option<Duration>,
}

impl WebServer {
    /// Listens on all interfaces. Port 0 picks any free port, see
    /// [`Self::port()`].
    pub fn bind(
        board: Arc<Board>,
        port: u16,
        watch_timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))?;
        listener.set_nonblocking(true)?;
        Ok(Self {
            listener,
            board,
            watch_timeout,
        })
    }

    pub fn port(&self) -> anyhow::Result<u16> {
        Ok(self.listener.local_addr()?.port())
    }

    /// Serves forever on a runtime of its own, so it can run on a plain
    /// thread next to the text server.
    pub fn serve(self) -> anyhow::Result<()> {
        let port = self.port()?;
        let app = router(AppState {
            board: self.board,
            watch_timeout: self.watch_timeout,
        });
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(self.listener)?;
            info!(port, "Serving HTTP");
            axum::serve(listener, app).await?;
            Ok::<(), anyhow::Error>(())
        })
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/look/:player", get(look))
        .route("/flip/:player/:coordinates", get(flip))
        .route("/watch/:player", get(watch))
        .fallback(not_recognized)
        .with_state(state)
}

fn reply(status: StatusCode, body: String) -> Response {
    (
        status,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
        ],
        body,
    )
        .into_response()
}

fn not_found(request: &str) -> Response {
    debug!(request, "Request not recognized");
    reply(
        StatusCode::NOT_FOUND,
        format!("Request: {} not recognized\n", request),
    )
}

fn view(board: &Board, player: &str) -> Response {
    match board.state(player) {
        Ok(state) => reply(StatusCode::OK, state.to_string()),
        Err(err) => {
            error!(player, %err, "Could not show the board");
            reply(StatusCode::INTERNAL_SERVER_ERROR, format!("{}\n", err))
        }
    }
}

/// `"<column>,<row>"`, both 1-based.
fn parse_coordinates(text: &str) -> Option<(usize, usize)> {
    let (column, row) = text.split_once(',')?;
    Some((column.parse().ok()?, row.parse().ok()?))
}

async fn not_recognized(uri: Uri) -> Response {
    not_found(uri.path())
}

async fn look(State(state): State<AppState>, Path(player): Path<String>) -> Response {
    if !is_valid_player_id(&player) {
        return not_found(&format!("/look/{}", player));
    }
    state.board.register_player(&player);
    view(&state.board, &player)
}

async fn flip(
    State(state): State<AppState>,
    Path((player, coordinates)): Path<(String, String)>,
) -> Response {
    let parsed = parse_coordinates(&coordinates).filter(|_| is_valid_player_id(&player));
    let Some((column, row)) = parsed else {
        return not_found(&format!("/flip/{}/{}", player, coordinates));
    };
    state.board.register_player(&player);
    if let Err(err) = state.board.flip(row, column, &player) {
        error!(player = player.as_str(), %err, "Flip failed");
        return reply(StatusCode::INTERNAL_SERVER_ERROR, format!("{}\n", err));
    }
    view(&state.board, &player)
}

async fn watch(State(state): State<AppState>, Path(player): Path<String>) -> Response {
    if !is_valid_player_id(&player) {
        return not_found(&format!("/watch/{}", player));
    }
    state.board.register_player(&player);
    let (board, timeout) = (Arc::clone(&state.board), state.watch_timeout);
    let waited = tokio::task::spawn_blocking(move || wait_for_change(&board, timeout)).await;
    if let Err(err) = waited {
        error!(player = player.as_str(), %err, "Watch failed");
        return reply(StatusCode::INTERNAL_SERVER_ERROR, format!("{}\n", err));
    }
    view(&state.board, &player)
}
