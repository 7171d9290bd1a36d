//! `floodnet` — run a flooding-protocol scenario and print the statistics.

mod scenario;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use floodnet_proto::NodeAddr;
use floodnet_sim::RunReport;

use crate::scenario::Scenario;

#[derive(Parser, Debug)]
#[command(name = "floodnet", about = "Discrete-event runner for the floodnet routing protocol")]
struct Args {
    /// Scenario description (TOML).
    #[arg(long)]
    scenario: PathBuf,
    /// Override the scenario's run duration, in seconds.
    #[arg(long)]
    duration: Option<f64>,
    /// Override the scenario's device-log directory.
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// Print the report as JSON instead of text.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut scenario = Scenario::load(&args.scenario)?;
    if let Some(duration) = args.duration {
        anyhow::ensure!(duration > 0.0, "--duration must be positive");
        scenario.duration_secs = duration;
    }
    if let Some(log_dir) = args.log_dir {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("creating log dir {}", log_dir.display()))?;
        scenario.log_dir = Some(log_dir);
    }

    let mut sim = scenario.build()?;
    let report = sim.run();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&render_json(&report))?);
    } else {
        print!("{}", render_text(&report));
    }
    Ok(())
}

fn render_text(report: &RunReport) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Run finished at {} after {} events",
        report.finished_at, report.events_processed
    );

    let mut current_node: Option<&NodeAddr> = None;
    let mut current_output = "";
    for (node, name, label, value) in report.outputs.iter() {
        if current_node != Some(node) {
            let _ = writeln!(out, "\n== Node {node}");
            current_node = Some(node);
            current_output = "";
        }
        if current_output != name {
            let _ = writeln!(out, "{name}");
            current_output = name;
        }
        let _ = writeln!(out, "  {label}: {value}");
    }

    for (node, app) in &report.apps {
        if app.bytes_delivered > 0 {
            let _ = writeln!(out, "\nNode {node}: {} bytes delivered", app.bytes_delivered);
        }
    }
    out
}

fn render_json(report: &RunReport) -> serde_json::Value {
    let mut outputs = serde_json::Map::new();
    for (node, name, label, value) in report.outputs.iter() {
        let per_node = outputs
            .entry(node.to_string())
            .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
        if let Some(per_node) = per_node.as_object_mut() {
            let per_output = per_node
                .entry(name.to_string())
                .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
            if let Some(per_output) = per_output.as_object_mut() {
                per_output.insert(label.to_string(), serde_json::json!(value));
            }
        }
    }

    let apps: serde_json::Map<String, serde_json::Value> = report
        .apps
        .iter()
        .map(|(node, app)| {
            let rates: Vec<serde_json::Value> = app
                .rates
                .iter()
                .map(|rate| {
                    serde_json::json!({
                        "peer": rate.peer.to_string(),
                        "received": rate.received,
                        "sent_by_peer": rate.sent_by_peer,
                        "reception_rate": rate.reception_rate,
                        "loss_rate": rate.loss_rate,
                    })
                })
                .collect();
            let value = serde_json::json!({
                "rates": rates,
                "bytes_delivered": app.bytes_delivered,
                "energy_nj_per_bit": app.energy_nj_per_bit,
            });
            (node.to_string(), value)
        })
        .collect();

    serde_json::json!({
        "finished_at_secs": report.finished_at.as_secs_f64(),
        "events_processed": report.events_processed,
        "outputs": outputs,
        "apps": apps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn json_report_has_the_top_level_sections() {
        let scenario: Scenario = toml::from_str(
            r#"
sink = "sink"
duration_secs = 10.0

[[nodes]]
addr = "0"
mac = 0
startup_delay_secs = 1.0

[[nodes]]
addr = "sink"
mac = 1

[[links]]
a = "0"
b = "sink"
"#,
        )
        .expect("parse");
        let mut sim = scenario.build().expect("build");
        let report = sim.run();

        let value = render_json(&report);
        assert!(value["outputs"]["sink"]["Routing packet breakdown (RX)"].is_object());
        assert!(value["apps"]["sink"]["rates"].is_array());
        assert!(value["events_processed"].as_u64().expect("count") > 0);

        let text = render_text(&report);
        assert!(text.contains("== Node sink"));
        assert!(text.contains("Packets forwarded to application layer"));
    }
}
