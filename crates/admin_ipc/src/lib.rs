use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use catalog::{Product, Season};
use market::{MarketSnapshot, MarketSummary, SeasonOutlook, TraderAlert};
use matching::{Match, MatchSummary};
use records::{
    DemandRecord, FarmPlantingRecord, ModerationQueue, NewDemandRecord, NewFarmRecord, NewUser,
    UserRef,
};
use risk::Recommendation;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::info;

pub const DEFAULT_SOCKET_PATH: &str = "/tmp/agrivers_market.sock";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", content = "payload")]
pub enum AdminRequest {
    Status,
    MarketSnapshot,
    MarketSummary,
    Matches,
    Recommendation { crop: Product, season: Season },
    FarmReport { farm_id: String },
    TraderAlerts { user_id: String },
    ModerationQueue,
    RegisterUser(NewUser),
    SubmitFarm(NewFarmRecord),
    SubmitDemand(NewDemandRecord),
    ApproveFarm { id: String },
    RejectFarm { id: String },
    ApproveDemand { id: String },
    RejectDemand { id: String },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AdminStatus {
    pub run_id: String,
    pub users: usize,
    pub farm_records: usize,
    pub demand_records: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TraderView {
    pub total_demand: u64,
    pub alerts: Vec<TraderAlert>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MarketOverview {
    pub market: MarketSummary,
    pub matches: MatchSummary,
    pub seasons: Vec<SeasonOutlook>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", content = "payload")]
pub enum AdminResponse {
    Status(AdminStatus),
    MarketSnapshot(Vec<MarketSnapshot>),
    MarketSummary(MarketOverview),
    Matches(Vec<Match>),
    Recommendation(Recommendation),
    FarmReport { file_name: String, text: String },
    TraderAlerts(TraderView),
    ModerationQueue(ModerationQueue),
    User(UserRef),
    FarmRecord(FarmPlantingRecord),
    DemandRecord(DemandRecord),
    Ack,
    NotFound(String),
    Error(String),
}

pub async fn run_server<F, Fut>(socket_path: &str, handler: F) -> Result<()>
where
    F: Fn(AdminRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<AdminResponse>> + Send + 'static,
{
    let _ = std::fs::remove_file(socket_path);
    let listener = UnixListener::bind(socket_path)?;
    let handler = Arc::new(handler);
    info!(socket = socket_path, "admin ipc listening");
    loop {
        let (stream, _) = listener.accept().await?;
        let handler = handler.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_stream(stream, handler).await {
                tracing::warn!(error = ?err, "admin ipc handler error");
            }
        });
    }
}

async fn handle_stream<F, Fut>(stream: UnixStream, handler: Arc<F>) -> Result<()>
where
    F: Fn(AdminRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<AdminResponse>> + Send + 'static,
{
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut buf = String::new();
    let n = reader.read_line(&mut buf).await?;
    if n == 0 {
        return Ok(());
    }
    let resp = match serde_json::from_str::<AdminRequest>(buf.trim()) {
        Ok(req) => handler(req)
            .await
            .unwrap_or_else(|err| AdminResponse::Error(format!("{err:#}"))),
        Err(err) => AdminResponse::Error(format!("invalid request: {err}")),
    };
    let line = serde_json::to_string(&resp)? + "\n";
    write_half.write_all(line.as_bytes()).await?;
    Ok(())
}

pub async fn send_request(socket_path: &str, req: &AdminRequest) -> Result<AdminResponse> {
    let mut stream = UnixStream::connect(socket_path).await?;
    let line = serde_json::to_string(req)? + "\n";
    stream.write_all(line.as_bytes()).await?;
    let (read_half, _) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut buf = String::new();
    let _ = reader.read_line(&mut buf).await?;
    let resp: AdminResponse = serde_json::from_str(buf.trim())?;
    Ok(resp)
}
