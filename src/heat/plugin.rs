//! 热网络插件

use bevy::prelude::*;

use crate::heat::config::HeatSimConfig;
use crate::heat::grid::HeatGrids;
use crate::heat::systems::{
    heat_report_system, heat_source_system, sync_heat_grid_links, venting_system,
};

/// 热模拟系统执行顺序
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum HeatSimSet {
    /// 1. 同步网格成员（宿主推送的接入/断开）
    Membership,

    /// 2. 热源产热
    Production,

    /// 3. 排热与损耗恢复
    Venting,

    /// 4. 状态日志
    Report,
}

/// 热网络插件 - 负责注册热网络相关的资源和系统
pub struct ShipHeatPlugin;

impl Plugin for ShipHeatPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HeatGrids>()
            .init_resource::<HeatSimConfig>()
            .configure_sets(
                Update,
                (
                    HeatSimSet::Membership,
                    HeatSimSet::Production,
                    HeatSimSet::Venting,
                    HeatSimSet::Report,
                )
                    .chain(),
            )
            .add_systems(Update, sync_heat_grid_links.in_set(HeatSimSet::Membership))
            .add_systems(Update, heat_source_system.in_set(HeatSimSet::Production))
            .add_systems(Update, venting_system.in_set(HeatSimSet::Venting))
            .add_systems(Update, heat_report_system.in_set(HeatSimSet::Report));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heat::components::{
        Flickable, HeatGridLink, HeatPurge, HeatSink, HeatSource, ShipHeat, ShipTurret,
    };

    fn test_app() -> App {
        let mut app = App::new();
        app.insert_resource(HeatSimConfig {
            vent_start_ratio: 0.9,
            vent_stop_ratio: 0.15,
            depletion_per_purged_heat: 0.0,
            depletion_recovery_per_tick: 0.0,
            report_interval: 0,
            ticks: 0,
        })
        .add_plugins(ShipHeatPlugin);
        app
    }

    #[test]
    fn test_links_attach_members() {
        let mut app = test_app();
        let sink = app
            .world_mut()
            .spawn((ShipHeat::default(), HeatSink::new(100.0).with_state(30.0, 0.0), HeatGridLink { grid_id: 4 }))
            .id();

        app.update();

        let grids = app.world().resource::<HeatGrids>();
        assert_eq!(grids.grid_of(sink), Some(4));
        assert!((grids.get(4).unwrap().storage_used() - 30.0).abs() < 1e-4);
        assert_eq!(app.world().get::<HeatSink>(sink).unwrap().heat_stored, 0.0);
    }

    #[test]
    fn test_link_removal_and_despawn_detach() {
        let mut app = test_app();
        let sink = app
            .world_mut()
            .spawn((ShipHeat::default(), HeatSink::new(100.0).with_state(30.0, 0.0), HeatGridLink { grid_id: 1 }))
            .id();
        let conduit = app
            .world_mut()
            .spawn((ShipHeat::default(), HeatGridLink { grid_id: 1 }))
            .id();
        app.update();

        // 移除连接：散热槽取回热量
        app.world_mut().entity_mut(sink).remove::<HeatGridLink>();
        app.update();
        assert!((app.world().get::<HeatSink>(sink).unwrap().heat_stored - 30.0).abs() < 1e-4);
        assert_eq!(app.world().resource::<HeatGrids>().grid_of(sink), None);

        // 销毁最后一个成员后网格被拆除
        app.world_mut().despawn(conduit);
        app.update();
        let grids = app.world().resource::<HeatGrids>();
        assert_eq!(grids.grid_of(conduit), None);
        assert!(grids.is_empty());
    }

    #[test]
    fn test_link_change_moves_member() {
        let mut app = test_app();
        let sink = app
            .world_mut()
            .spawn((ShipHeat::default(), HeatSink::new(50.0).with_state(10.0, 0.0), HeatGridLink { grid_id: 1 }))
            .id();
        app.update();

        app.world_mut().entity_mut(sink).insert(HeatGridLink { grid_id: 2 });
        app.update();

        let grids = app.world().resource::<HeatGrids>();
        assert_eq!(grids.grid_of(sink), Some(2));
        assert!((grids.get(2).unwrap().storage_used() - 10.0).abs() < 1e-4);
        assert!(grids.get(1).is_none());
    }

    #[test]
    fn test_heat_cycle_vents_and_recovers() {
        let mut app = test_app();
        let world = app.world_mut();
        let enemy = world.spawn_empty().id();
        let purge = world
            .spawn((
                ShipHeat::default(),
                HeatSink::new(100.0),
                HeatPurge { purge_per_tick: 10.0 },
                HeatGridLink { grid_id: 1 },
            ))
            .id();
        let reactor = world
            .spawn((
                ShipHeat::default(),
                HeatSource { heat_per_tick: 20.0 },
                Flickable { switch_on: true },
                HeatGridLink { grid_id: 1 },
            ))
            .id();
        let turret = world
            .spawn((
                ShipHeat::default(),
                ShipTurret { forced_target: Some(enemy) },
                HeatGridLink { grid_id: 1 },
            ))
            .id();

        // 20/tick，第 5 个 tick 装满并开始排热
        for _ in 0..5 {
            app.update();
        }
        {
            let world = app.world_mut();
            assert!(world.get::<ShipHeat>(purge).unwrap().venting);
            assert!(world.get::<ShipHeat>(turret).unwrap().venting);
            assert!(world.get::<ShipTurret>(turret).unwrap().forced_target.is_none());
            // 热源不参与排热状态传播
            assert!(!world.get::<ShipHeat>(reactor).unwrap().venting);
            let mut grids = world.resource_mut::<HeatGrids>();
            let net = grids.get_mut(1).unwrap();
            assert!(net.is_venting());
            assert!((net.storage_used() - 90.0).abs() < 1e-4);
        }

        // 关闭热源后排热口逐步排空
        app.world_mut().get_mut::<Flickable>(reactor).unwrap().switch_on = false;
        for _ in 0..20 {
            app.update();
        }

        let world = app.world_mut();
        assert!(!world.get::<ShipHeat>(purge).unwrap().venting);
        let mut grids = world.resource_mut::<HeatGrids>();
        let net = grids.get_mut(1).unwrap();
        assert!(!net.is_venting());
        assert!(net.ratio_in_network() <= 0.15);
    }

    #[test]
    fn test_sinkless_grid_gains_no_heat() {
        let mut app = test_app();
        let reactor = app
            .world_mut()
            .spawn((
                ShipHeat::default(),
                HeatSource { heat_per_tick: 10.0 },
                HeatGridLink { grid_id: 1 },
            ))
            .id();
        app.world_mut()
            .spawn((ShipHeat::default(), HeatGridLink { grid_id: 1 }));

        for _ in 0..50 {
            app.update();
        }
        {
            let grids = app.world().resource::<HeatGrids>();
            let net = grids.get(1).unwrap();
            assert_eq!(net.storage_used(), 0.0);
            assert!(!net.is_venting());
        }

        // 之后接入的散热槽不会超出自身容量
        app.world_mut().spawn((
            ShipHeat::default(),
            HeatSink::new(50.0),
            HeatGridLink { grid_id: 1 },
        ));
        app.update();
        let mut grids = app.world_mut().resource_mut::<HeatGrids>();
        let net = grids.get_mut(1).unwrap();
        assert!((net.storage_used() - 10.0).abs() < 1e-4);
        assert!(net.storage_used() <= net.storage_capacity_raw());
        assert_eq!(grids.grid_of(reactor), Some(1));
    }

    #[test]
    fn test_depletion_accrues_and_recovers() {
        let mut app = App::new();
        app.insert_resource(HeatSimConfig {
            vent_start_ratio: 0.5,
            vent_stop_ratio: 0.0,
            depletion_per_purged_heat: 0.5,
            depletion_recovery_per_tick: 1.0,
            report_interval: 0,
            ticks: 0,
        })
        .add_plugins(ShipHeatPlugin);
        app.world_mut().spawn((
            ShipHeat::default(),
            HeatSink::new(100.0).with_state(60.0, 0.0),
            HeatPurge { purge_per_tick: 30.0 },
            HeatGridLink { grid_id: 1 },
        ));

        // 第 1 个 tick：60% 开始排热，排出 30，损耗 +15
        app.update();
        {
            let mut grids = app.world_mut().resource_mut::<HeatGrids>();
            let net = grids.get_mut(1).unwrap();
            assert!((net.storage_used() - 30.0).abs() < 1e-4);
            assert!((net.depletion() - 15.0).abs() < 1e-4);
            assert!((net.storage_capacity() - 85.0).abs() < 1e-3);
        }

        // 第 2 个 tick：排空（损耗再 +15）并结束排热
        app.update();
        // 第 3 个 tick：恢复 1 点损耗
        app.update();
        let mut grids = app.world_mut().resource_mut::<HeatGrids>();
        let net = grids.get_mut(1).unwrap();
        assert!(!net.is_venting());
        assert_eq!(net.storage_used(), 0.0);
        assert!((net.depletion() - 29.0).abs() < 1e-4);
    }
}
