use admin_ipc::{send_request, AdminRequest, AdminResponse, DEFAULT_SOCKET_PATH};
use anyhow::Result;
use catalog::{Period, Product, Role, Season};
use clap::{Parser, Subcommand};
use records::{NewDemandRecord, NewFarmRecord, NewUser};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "ADMIN_SOCKET", default_value = DEFAULT_SOCKET_PATH)]
    socket: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Status,
    /// Supply/demand balance for every product.
    Snapshot,
    Summary,
    Matches {
        /// Include products with no farmers and no traders.
        #[arg(long)]
        all: bool,
    },
    Recommend {
        crop: Product,
        season: Season,
    },
    /// Print the recommendation report for a planting record.
    Report {
        farm_id: String,
    },
    Alerts {
        user_id: String,
    },
    Moderation,
    RegisterUser {
        name: String,
        email: String,
        role: Role,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        region: String,
    },
    SubmitFarm {
        user_id: String,
        crop: Product,
        area: String,
        season: Season,
    },
    SubmitDemand {
        user_id: String,
        product: Product,
        quantity: String,
        period: Period,
    },
    ApproveFarm {
        id: String,
    },
    RejectFarm {
        id: String,
    },
    ApproveDemand {
        id: String,
    },
    RejectDemand {
        id: String,
    },
}

fn request_for(command: &Command) -> AdminRequest {
    match command {
        Command::Status => AdminRequest::Status,
        Command::Snapshot => AdminRequest::MarketSnapshot,
        Command::Summary => AdminRequest::MarketSummary,
        Command::Matches { .. } => AdminRequest::Matches,
        Command::Recommend { crop, season } => AdminRequest::Recommendation {
            crop: *crop,
            season: *season,
        },
        Command::Report { farm_id } => AdminRequest::FarmReport {
            farm_id: farm_id.clone(),
        },
        Command::Alerts { user_id } => AdminRequest::TraderAlerts {
            user_id: user_id.clone(),
        },
        Command::Moderation => AdminRequest::ModerationQueue,
        Command::RegisterUser {
            name,
            email,
            role,
            phone,
            region,
        } => AdminRequest::RegisterUser(NewUser {
            name: name.clone(),
            email: email.clone(),
            phone: phone.clone(),
            region: region.clone(),
            role: *role,
        }),
        Command::SubmitFarm {
            user_id,
            crop,
            area,
            season,
        } => AdminRequest::SubmitFarm(NewFarmRecord {
            user_id: user_id.clone(),
            crop: *crop,
            area: area.clone(),
            season: *season,
        }),
        Command::SubmitDemand {
            user_id,
            product,
            quantity,
            period,
        } => AdminRequest::SubmitDemand(NewDemandRecord {
            user_id: user_id.clone(),
            product: *product,
            quantity: quantity.clone(),
            period: *period,
        }),
        Command::ApproveFarm { id } => AdminRequest::ApproveFarm { id: id.clone() },
        Command::RejectFarm { id } => AdminRequest::RejectFarm { id: id.clone() },
        Command::ApproveDemand { id } => AdminRequest::ApproveDemand { id: id.clone() },
        Command::RejectDemand { id } => AdminRequest::RejectDemand { id: id.clone() },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let req = request_for(&cli.command);

    match send_request(&cli.socket, &req).await? {
        AdminResponse::FarmReport { text, .. } => print!("{text}"),
        AdminResponse::Matches(matches) => {
            let show_all = matches!(cli.command, Command::Matches { all: true });
            let visible: Vec<_> = matches
                .into_iter()
                .filter(|m| show_all || m.has_participants())
                .collect();
            println!("{}", serde_json::to_string_pretty(&visible)?);
        }
        resp => println!("{}", serde_json::to_string(&resp)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_catalog_arguments() {
        let cli = Cli::parse_from(["marketctl", "recommend", "Tomatoes", "Fall"]);
        match request_for(&cli.command) {
            AdminRequest::Recommendation { crop, season } => {
                assert_eq!(crop, Product::Tomatoes);
                assert_eq!(season, Season::Fall);
            }
            other => panic!("unexpected request {other:?}"),
        }
        assert_eq!(cli.socket, DEFAULT_SOCKET_PATH);
    }

    #[test]
    fn rejects_products_outside_the_catalog() {
        let err = Cli::try_parse_from(["marketctl", "recommend", "Rice", "Fall"])
            .expect_err("rice is not tradable");
        assert!(err.to_string().contains("unknown product `Rice`"));
    }

    #[test]
    fn builds_submission_requests() {
        let cli = Cli::parse_from([
            "marketctl",
            "submit-demand",
            "trader-1",
            "Potato",
            "120",
            "Weekly",
        ]);
        match request_for(&cli.command) {
            AdminRequest::SubmitDemand(record) => {
                assert_eq!(record.product, Product::Potato);
                assert_eq!(record.quantity, "120");
                assert_eq!(record.period, Period::Weekly);
            }
            other => panic!("unexpected request {other:?}"),
        }

        let cli = Cli::parse_from([
            "marketctl",
            "register-user",
            "Abeer",
            "abeer@example.com",
            "farmer",
            "--region",
            "Qassim",
        ]);
        assert!(matches!(
            request_for(&cli.command),
            AdminRequest::RegisterUser(NewUser { role: Role::Farmer, ref region, .. }) if region == "Qassim"
        ));
    }
}
