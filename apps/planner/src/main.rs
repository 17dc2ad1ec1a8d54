use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use session::{load_session_settings, SessionController, StatusPanel, UserAction};
use shared::domain::{EdgeId, GeoPoint, HouseId};
use solver_client::HttpSolverBackend;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod substations;
mod surface;

use surface::LogSurface;

/// Designs a distribution network for a fixed set of houses against a
/// running solver, optionally failing one edge of the result.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    solver_url: Option<String>,
    /// Rupees per meter of cable, as typed into the cost field.
    #[arg(long)]
    cost_per_meter: String,
    /// House location as `LAT,LNG`; repeat for each house.
    #[arg(long = "house", value_parser = parse_point, required = true)]
    houses: Vec<GeoPoint>,
    /// 1-based tree edge to fail once the layout is drawn.
    #[arg(long)]
    fail_edge: Option<usize>,
    /// Drag a house after the layout is drawn, as `ID=LAT,LNG`.
    #[arg(long, value_parser = parse_move)]
    move_house: Option<(HouseId, GeoPoint)>,
    #[arg(long)]
    analyze: bool,
    /// Directory to write the exported network into.
    #[arg(long)]
    export: Option<PathBuf>,
    /// Milliseconds between revealed tree edges.
    #[arg(long)]
    edge_reveal_millis: Option<u64>,
}

fn parse_point(raw: &str) -> Result<GeoPoint, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG, got '{raw}'"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{lat}'"))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{lng}'"))?;
    let point = GeoPoint::new(lat, lng);
    if !point.is_valid() {
        return Err(format!("coordinates out of range: {raw}"));
    }
    Ok(point)
}

fn parse_move(raw: &str) -> Result<(HouseId, GeoPoint), String> {
    let (id, point) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ID=LAT,LNG, got '{raw}'"))?;
    let id: u32 = id
        .trim()
        .parse()
        .map_err(|_| format!("invalid house id '{id}'"))?;
    Ok((HouseId(id), parse_point(point)?))
}

fn print_panels(controller: &SessionController<LogSurface>) {
    for panel in StatusPanel::ALL {
        if let Some(message) = controller.surface().panel(panel) {
            println!("[{panel:?}] {}", message.title);
            for line in &message.lines {
                println!("    {line}");
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let args = Args::parse();

    let mut settings = load_session_settings();
    if let Some(url) = args.solver_url {
        settings.solver_url = url;
    }
    if let Some(millis) = args.edge_reveal_millis {
        settings.edge_reveal_millis = millis;
    }

    let backend = HttpSolverBackend::new(&settings.solver_url, settings.request_timeout())
        .with_context(|| format!("invalid solver url '{}'", settings.solver_url))?;
    info!(solver = %backend.base_url(), "using solver");
    let mut controller = SessionController::mount(
        settings,
        Arc::new(backend),
        substations::dehradun(),
        LogSurface::default(),
    );

    match controller.solver().health().await {
        Ok(reply) if reply.is_healthy() => info!(version = ?reply.version, "solver healthy"),
        Ok(reply) => warn!(error = ?reply.error, "solver reports unhealthy"),
        Err(err) => warn!(%err, "solver health check failed"),
    }

    controller.handle(UserAction::EnableAddMode)?;
    for house in &args.houses {
        controller.handle(UserAction::MapClicked(*house))?;
    }
    controller.handle(UserAction::SetCostPerMeter(args.cost_per_meter))?;
    controller.handle(UserAction::RequestCompute)?;
    controller.settle().await;
    print_panels(&controller);

    if controller.store().primary().is_none() {
        bail!("no layout was produced");
    }

    if let Some((house, to)) = args.move_house {
        let marker = controller
            .marker_for_house(house)
            .ok_or_else(|| anyhow!("no house with id {house}"))?;
        controller.handle(UserAction::MarkerDragged { marker, to })?;
        controller.settle().await;
        print_panels(&controller);
    }

    if let Some(index) = args.fail_edge {
        let edge = index
            .checked_sub(1)
            .map(EdgeId)
            .ok_or_else(|| anyhow!("edges are numbered from 1"))?;
        let line = controller
            .line_for_edge(edge)
            .ok_or_else(|| anyhow!("the layout has no edge {index}"))?;
        controller.handle(UserAction::LineClicked(line))?;
        controller.settle().await;
        print_panels(&controller);
    }

    if args.analyze {
        let layout = controller
            .store()
            .primary()
            .ok_or_else(|| anyhow!("no layout to analyze"))?;
        let analysis = controller
            .solver()
            .analyze_network(
                controller.store().houses(),
                layout.cost_per_meter,
                controller.substations(),
            )
            .await?;
        let metrics = &analysis.network_metrics;
        println!(
            "Network analysis: {} edges, {} critical, {} high impact, reliability score {}, resilience {:?}",
            metrics.total_edges,
            metrics.critical_edges,
            metrics.high_impact_edges,
            metrics.reliability_score,
            metrics.resilience_level
        );
        for edge in &analysis.edge_analysis {
            println!(
                "    edge {}: {} ({:.2} extra)",
                edge.edge_index + 1,
                edge.impact_level,
                edge.cost_impact
            );
        }
    }

    if let Some(dir) = args.export {
        let snapshot = controller.export()?;
        let path = dir.join(snapshot.file_name());
        tokio::fs::write(&path, snapshot.to_json_pretty()?)
            .await
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        println!("Exported network to {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
