//! 演示舰船
//!
//! 启动时在 1 号网格生成一艘小型舰船：
//! - 反应堆（热源）
//! - 两个散热槽和一个排热口
//! - 护盾、炮塔、隐形装置与一段导热管道
//!
//! 第一次成员同步后升起护盾

use bevy::prelude::*;

use super::components::{
    CloakingDevice, CombatShield, Flickable, HeatGridLink, HeatPurge, HeatSink, HeatSource,
    ShipHeat, ShipTurret,
};
use super::grid::HeatGrids;
use super::plugin::HeatSimSet;

/// 演示舰船所在网格
pub const DEMO_GRID: u32 = 1;

/// 演示舰船插件
pub struct DemoShipPlugin;

impl Plugin for DemoShipPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_demo_ship).add_systems(
            Update,
            raise_shields_once
                .after(HeatSimSet::Membership)
                .before(HeatSimSet::Production),
        );
    }
}

/// 生成演示舰船
pub fn spawn_demo_ship(mut commands: Commands) {
    let link = HeatGridLink { grid_id: DEMO_GRID };
    let enemy = commands.spawn(Name::new("Enemy Frigate")).id();

    commands.spawn((
        Name::new("Reactor"),
        ShipHeat::default(),
        HeatSource { heat_per_tick: 12.0 },
        Flickable { switch_on: true },
        link,
    ));
    for i in 0..2 {
        commands.spawn((
            Name::new(format!("Heat Sink {}", i)),
            ShipHeat::default(),
            HeatSink::new(200.0).with_state(40.0, 0.0),
            link,
        ));
    }
    commands.spawn((
        Name::new("Heat Purge"),
        ShipHeat::default(),
        HeatSink::new(100.0),
        HeatPurge { purge_per_tick: 30.0 },
        link,
    ));
    commands.spawn((
        Name::new("Shield Generator"),
        ShipHeat::default(),
        CombatShield,
        Flickable { switch_on: false },
        link,
    ));
    commands.spawn((
        Name::new("Laser Turret"),
        ShipHeat::default(),
        HeatSource { heat_per_tick: 4.0 },
        ShipTurret {
            forced_target: Some(enemy),
        },
        link,
    ));
    commands.spawn((
        Name::new("Cloaking Device"),
        ShipHeat::default(),
        HeatSource { heat_per_tick: 2.0 },
        CloakingDevice,
        Flickable { switch_on: false },
        link,
    ));
    commands.spawn((Name::new("Heat Conduit"), ShipHeat::default(), link));

    info!("Spawned demo ship on heat grid {}", DEMO_GRID);
}

/// 演示网格建立后升起护盾（只执行一次）
fn raise_shields_once(world: &mut World, mut done: Local<bool>) {
    if *done {
        return;
    }
    world.resource_scope(|world, grids: Mut<HeatGrids>| {
        if let Some(net) = grids.get(DEMO_GRID) {
            net.shields_on(world);
            info!("Raised {} shield(s) on heat grid {}", net.shields().len(), DEMO_GRID);
            *done = true;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heat::config::HeatSimConfig;
    use crate::heat::plugin::ShipHeatPlugin;

    #[test]
    fn test_demo_ship_registers() {
        let mut app = App::new();
        app.insert_resource(HeatSimConfig {
            report_interval: 0,
            ..default()
        })
        .add_plugins((ShipHeatPlugin, DemoShipPlugin));

        app.update();

        let world = app.world_mut();
        world.resource_scope(|world, mut grids: Mut<HeatGrids>| {
            let net = grids.get_mut(DEMO_GRID).unwrap();
            assert_eq!(net.sources().len(), 2);
            assert_eq!(net.cloaks().len(), 1);
            assert_eq!(net.sinks().len(), 3);
            assert_eq!(net.heat_purges().len(), 1);
            assert_eq!(net.shields().len(), 1);
            assert_eq!(net.turrets().len(), 1);
            assert_eq!(net.connectors().len(), 1);
            assert!((net.storage_capacity_raw() - 500.0).abs() < 1e-4);
            // 80 初始热量 + 第一个 tick 的 16 产热（隐形装置未开启）
            assert!((net.storage_used() - 96.0).abs() < 1e-4);
            assert!(net.any_shield_on(world));
            assert!(!net.any_cloak_on(world));
        });
    }
}
