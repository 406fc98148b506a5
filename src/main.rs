mod heat;

use bevy::log::LogPlugin;
use bevy::prelude::*;
use heat::{DemoShipPlugin, HeatGrids, HeatMembers, HeatSimConfig, ShipHeatPlugin};

fn main() {
    // 从命令行或环境变量读取 tick 数
    let config = HeatSimConfig::from_env_and_args();
    let ticks = config.ticks;

    let mut app = App::new();
    app.insert_resource(config)
        .add_plugins((MinimalPlugins, LogPlugin::default()))
        .add_plugins((ShipHeatPlugin, DemoShipPlugin));

    print_controls();

    app.finish();
    app.cleanup();
    for _ in 0..ticks {
        app.update();
    }

    print_summary(app.world_mut());
}

fn print_controls() {
    println!("=== Ship Heat Demo ===");
    println!("  --ticks <n>, -t <n>   - Number of simulation ticks");
    println!("  SHIPHEAT_TICKS=<n>    - Same, from the environment");
    println!();
}

fn print_summary(world: &mut World) {
    world.resource_scope(|world, mut grids: Mut<HeatGrids>| {
        println!("=== Final Heat Grids ({}) ===", grids.len());
        if grids.is_empty() {
            println!("  (no grids)");
            return;
        }
        for grid_id in grids.grid_ids() {
            let Some(net) = grids.get_mut(grid_id) else {
                continue;
            };
            let capacity = net.storage_capacity();
            let ratio = net.ratio_in_network();
            println!(
                "  grid {}: {} members, heat {:.1}/{:.1} ({:.0}%), depletion {:.1}, venting {}, shields {}",
                grid_id,
                net.members().len(),
                net.storage_used(),
                capacity,
                ratio * 100.0,
                net.depletion(),
                net.is_venting(),
                net.any_shield_on(world)
            );
            println!(
                "    sinks {} (purge {}), sources {} (cloak {}), shields {}, turrets {}, conduits {}",
                net.sinks().len(),
                net.heat_purges().len(),
                net.sources().len(),
                net.cloaks().len(),
                net.shields().len(),
                net.turrets().len(),
                net.connectors().len()
            );

            // 排热状态与角色不一致的成员
            for member in net.members() {
                let Some(role) = net.role_of(member) else {
                    continue;
                };
                let expected = net.is_venting() && role.receives_venting();
                if world.is_venting(member) != expected {
                    println!("    {:?} ({:?}) venting flag out of sync", member, role);
                }
            }
        }
    });
}
