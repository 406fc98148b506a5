//! 成员表接口
//!
//! 热网络不拥有成员，所有对成员状态的读写都通过 `HeatMembers` 完成。
//! 宿主的 `World` 直接实现该接口。

use bevy::prelude::*;

use super::components::{
    CloakingDevice, CombatShield, Flickable, HeatPurge, HeatSink, HeatSource, ShipHeat,
    ShipTurret,
};
use super::flags::HeatCaps;

/// 外部成员表
///
/// 句柄失效（实体已销毁）时读操作返回默认值，写操作什么都不做
pub trait HeatMembers {
    /// 成员的能力集合
    fn caps(&self, member: Entity) -> HeatCaps;

    /// 成员自身的排热标志
    fn is_venting(&self, member: Entity) -> bool;

    /// 设置成员自身的排热标志
    fn set_venting(&mut self, member: Entity, venting: bool);

    /// 读取散热槽状态
    fn sink(&self, member: Entity) -> Option<HeatSink>;

    /// 写回散热槽本地储热与损耗
    fn set_sink_state(&mut self, member: Entity, heat_stored: f32, depletion: f32);

    /// 开关是否打开
    fn switch_on(&self, member: Entity) -> bool;

    /// 设置开关
    fn set_switch(&mut self, member: Entity, on: bool);

    /// 清除炮塔的强制目标
    fn reset_forced_target(&mut self, member: Entity);
}

impl HeatCaps {
    /// 从实体挂载的组件推断能力集合
    pub fn detect(world: &World, member: Entity) -> Self {
        let mut caps = HeatCaps::default();

        if world.get::<HeatSink>(member).is_some() {
            caps.insert(HeatCaps::SINK);
            if world.get::<HeatPurge>(member).is_some() {
                caps.insert(HeatCaps::PURGE);
            }
        }
        if world.get::<HeatSource>(member).is_some() {
            caps.insert(HeatCaps::SOURCE);
        }
        if world.get::<CombatShield>(member).is_some() {
            caps.insert(HeatCaps::SHIELD);
        }
        if world.get::<ShipTurret>(member).is_some() {
            caps.insert(HeatCaps::TURRET);
        }
        if world.get::<CloakingDevice>(member).is_some() {
            caps.insert(HeatCaps::CLOAK);
        }

        caps
    }
}

impl HeatMembers for World {
    fn caps(&self, member: Entity) -> HeatCaps {
        HeatCaps::detect(self, member)
    }

    fn is_venting(&self, member: Entity) -> bool {
        self.get::<ShipHeat>(member).is_some_and(|heat| heat.venting)
    }

    fn set_venting(&mut self, member: Entity, venting: bool) {
        match self.get_mut::<ShipHeat>(member) {
            Some(mut heat) => heat.venting = venting,
            None => warn!("Heat member {:?} has no ShipHeat component", member),
        }
    }

    fn sink(&self, member: Entity) -> Option<HeatSink> {
        self.get::<HeatSink>(member).copied()
    }

    fn set_sink_state(&mut self, member: Entity, heat_stored: f32, depletion: f32) {
        if let Some(mut sink) = self.get_mut::<HeatSink>(member) {
            sink.heat_stored = heat_stored;
            sink.depletion = depletion;
        }
    }

    fn switch_on(&self, member: Entity) -> bool {
        self.get::<Flickable>(member).is_some_and(|flick| flick.switch_on)
    }

    fn set_switch(&mut self, member: Entity, on: bool) {
        if let Some(mut flick) = self.get_mut::<Flickable>(member) {
            flick.switch_on = on;
        }
    }

    fn reset_forced_target(&mut self, member: Entity) {
        if let Some(mut turret) = self.get_mut::<ShipTurret>(member) {
            turret.forced_target = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_caps() {
        let mut world = World::new();

        let purge = world
            .spawn((ShipHeat::default(), HeatSink::new(50.0), HeatPurge { purge_per_tick: 5.0 }))
            .id();
        assert_eq!(world.caps(purge), HeatCaps::SINK | HeatCaps::PURGE);

        let cloak = world
            .spawn((ShipHeat::default(), HeatSource { heat_per_tick: 1.0 }, CloakingDevice))
            .id();
        assert_eq!(world.caps(cloak), HeatCaps::SOURCE | HeatCaps::CLOAK);

        let conduit = world.spawn(ShipHeat::default()).id();
        assert_eq!(world.caps(conduit), HeatCaps::NONE);
    }

    #[test]
    fn test_purge_component_without_sink_ignored() {
        let mut world = World::new();
        let e = world
            .spawn((ShipHeat::default(), HeatPurge { purge_per_tick: 5.0 }))
            .id();
        assert_eq!(world.caps(e), HeatCaps::NONE);
    }

    #[test]
    fn test_member_writes() {
        let mut world = World::new();
        let target = world.spawn_empty().id();
        let turret = world
            .spawn((
                ShipHeat::default(),
                ShipTurret {
                    forced_target: Some(target),
                },
                Flickable { switch_on: false },
            ))
            .id();

        world.set_venting(turret, true);
        assert!(world.is_venting(turret));

        world.set_switch(turret, true);
        assert!(world.switch_on(turret));

        world.reset_forced_target(turret);
        assert!(world.get::<ShipTurret>(turret).unwrap().forced_target.is_none());
    }

    #[test]
    fn test_despawned_member_reads_default() {
        let mut world = World::new();
        let e = world.spawn((ShipHeat { venting: true }, HeatSink::new(10.0))).id();
        world.despawn(e);

        assert_eq!(world.caps(e), HeatCaps::NONE);
        assert!(!world.is_venting(e));
        assert!(world.sink(e).is_none());
        assert!(!world.switch_on(e));

        // 写操作不应 panic
        world.set_sink_state(e, 1.0, 1.0);
        world.set_switch(e, true);
        world.reset_forced_target(e);
    }
}
