use admin_ipc::{AdminRequest, AdminResponse, AdminStatus, MarketOverview, TraderView};
use anyhow::Result;
use chrono::Utc;
use engine::MarketEngine;
use records::RecordSet;
use storage::Store;
use tracing::info;
use web::MetricsHandle;

#[derive(Clone)]
pub struct Daemon {
    pub run_id: String,
    pub store: Store,
    pub metrics: MetricsHandle,
}

impl Daemon {
    /// Fresh engine over the current store contents.
    async fn engine(&self) -> Result<MarketEngine<RecordSet>> {
        let records = self.store.load_records().await?;
        self.metrics.market_recomputes().inc();
        Ok(MarketEngine::new(records))
    }

    pub async fn dispatch(&self, req: AdminRequest) -> Result<AdminResponse> {
        let resp = match req {
            AdminRequest::Status => {
                let records = self.store.load_records().await?;
                AdminResponse::Status(AdminStatus {
                    run_id: self.run_id.clone(),
                    users: records.users.len(),
                    farm_records: records.farm_records.len(),
                    demand_records: records.demand_records.len(),
                })
            }
            AdminRequest::MarketSnapshot => {
                AdminResponse::MarketSnapshot(self.engine().await?.market_snapshot())
            }
            AdminRequest::MarketSummary => {
                let engine = self.engine().await?;
                AdminResponse::MarketSummary(MarketOverview {
                    market: engine.market_summary(),
                    matches: engine.match_summary(),
                    seasons: engine.seasonal_summary(),
                })
            }
            AdminRequest::Matches => AdminResponse::Matches(self.engine().await?.matches()),
            AdminRequest::Recommendation { crop, season } => {
                AdminResponse::Recommendation(self.engine().await?.recommendation(crop, season))
            }
            AdminRequest::FarmReport { farm_id } => {
                match self.engine().await?.farm_report(&farm_id, Utc::now()) {
                    Some(report) => AdminResponse::FarmReport {
                        file_name: report.file_name(),
                        text: report.to_string(),
                    },
                    None => AdminResponse::NotFound(farm_id),
                }
            }
            AdminRequest::TraderAlerts { user_id } => {
                let engine = self.engine().await?;
                AdminResponse::TraderAlerts(TraderView {
                    total_demand: engine.trader_total_demand(&user_id),
                    alerts: engine.trader_alerts(&user_id),
                })
            }
            AdminRequest::ModerationQueue => {
                AdminResponse::ModerationQueue(self.store.load_records().await?.moderation_queue())
            }
            AdminRequest::RegisterUser(user) => {
                AdminResponse::User(self.store.register_user(&user).await?)
            }
            AdminRequest::SubmitFarm(record) => {
                AdminResponse::FarmRecord(self.store.submit_farm_record(&record).await?)
            }
            AdminRequest::SubmitDemand(record) => {
                AdminResponse::DemandRecord(self.store.submit_demand_record(&record).await?)
            }
            AdminRequest::ApproveFarm { id } => {
                found(self.store.approve_farm_record(&id).await?, id)
            }
            AdminRequest::RejectFarm { id } => found(self.store.reject_farm_record(&id).await?, id),
            AdminRequest::ApproveDemand { id } => {
                found(self.store.approve_demand_record(&id).await?, id)
            }
            AdminRequest::RejectDemand { id } => {
                found(self.store.reject_demand_record(&id).await?, id)
            }
        };
        Ok(resp)
    }
}

fn found(present: bool, id: String) -> AdminResponse {
    if present {
        info!(record_id = %id, "moderation applied");
        AdminResponse::Ack
    } else {
        AdminResponse::NotFound(id)
    }
}
