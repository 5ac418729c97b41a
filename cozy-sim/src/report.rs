use std::io::Write;

use anyhow::Result;
use colored::Colorize;

use crate::simulation::SimulationReport;

pub fn write_console(out: &mut dyn Write, report: &SimulationReport) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Simulation Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "=====================".cyan())?;
    writeln!(out, "Seed: {}", report.seed)?;
    writeln!(
        out,
        "Missions: {} x {} min",
        report.missions.len(),
        report.minutes_per_mission
    )?;
    writeln!(out, "Starting balance: {} 🌸", report.starting_balance)?;
    writeln!(
        out,
        "Total flowers: {}",
        report.total_flowers().to_string().green()
    )?;
    writeln!(out, "Final balance: {} 🌸", report.profile.balance)?;
    writeln!(out)?;

    for mission in &report.missions {
        let drop = mission
            .unlocked
            .as_deref()
            .map_or_else(|| "-".dimmed().to_string(), |id| id.magenta().to_string());
        writeln!(
            out,
            "  #{:<3} +{:<5} balance {:<7} drop {}",
            mission.index, mission.flowers, mission.balance, drop
        )?;
    }

    if !report.purchases.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", "🛍️  Closet".bright_yellow().bold())?;
        for purchase in &report.purchases {
            let status = if purchase.success {
                "✅".green()
            } else {
                "❌".red()
            };
            writeln!(out, "  {status} {} - {}", purchase.outfit, purchase.detail)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "{}", "👕 Profile".bright_blue().bold())?;
    writeln!(out, "  Wearing: {}", report.profile.equipped_outfit)?;
    writeln!(
        out,
        "  Unlocked: {}",
        report.profile.unlocked_outfits.join(", ")
    )?;
    writeln!(out, "  Strategy: {}", report.profile.strategy)?;
    writeln!(out, "  Events delivered: {}", report.events_seen)?;
    Ok(())
}

pub fn write_json(out: &mut dyn Write, report: &SimulationReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{SimulationPlan, run};
    use cozy_core::MemoryStore;

    fn sample() -> SimulationReport {
        run(
            MemoryStore::new(),
            &SimulationPlan {
                missions: 2,
                minutes: 60.0,
                seed: 9,
                strategy: Some("degen".into()),
                purchases: vec!["winter_cozy".into()],
                fresh: false,
            },
        )
        .unwrap()
    }

    #[test]
    fn console_report_lists_totals_and_purchases() {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        write_console(&mut buf, &sample()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Simulation Summary"));
        assert!(text.contains("Total flowers: 1200"));
        assert!(text.contains("winter_cozy - bought Shy Pudding"));
        assert!(text.contains("Strategy: degen"));
    }

    #[test]
    fn json_report_uses_camel_case() {
        let mut buf = Vec::new();
        write_json(&mut buf, &sample()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["seed"], 9);
        assert_eq!(value["missions"].as_array().unwrap().len(), 2);
        assert_eq!(value["profile"]["strategy"], "degen");
        assert_eq!(value["profile"]["balance"], 900);
    }
}
