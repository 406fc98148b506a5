//! 热网络成员组件
//!
//! 成员实体由宿主世界拥有，热网络只保存 `Entity` 句柄

use bevy::prelude::*;

/// 热组件 - 每个接入热网络的模块都带有
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ShipHeat {
    /// 该模块是否处于排热状态
    pub venting: bool,
}

/// 散热槽 - 本地储热并贡献网络容量
///
/// 接入网络时本地热量和损耗并入网络总量并清零，
/// 断开时按容量比例取回自己的份额
#[derive(Component, Debug, Clone, Copy)]
pub struct HeatSink {
    /// 本地储存的热量
    pub heat_stored: f32,
    /// 本地损耗
    pub depletion: f32,
    /// 热容量（常量）
    pub heat_capacity: f32,
}

impl HeatSink {
    /// 创建空的散热槽
    pub fn new(heat_capacity: f32) -> Self {
        Self {
            heat_stored: 0.0,
            depletion: 0.0,
            heat_capacity,
        }
    }

    /// 设置初始储热与损耗
    pub fn with_state(mut self, heat_stored: f32, depletion: f32) -> Self {
        self.heat_stored = heat_stored;
        self.depletion = depletion;
        self
    }
}

/// 排热口 - 排热时每个 tick 排出的热量
#[derive(Component, Debug, Clone, Copy)]
pub struct HeatPurge {
    pub purge_per_tick: f32,
}

/// 热源 - 每个 tick 向网络注入的热量
#[derive(Component, Debug, Clone, Copy)]
pub struct HeatSource {
    pub heat_per_tick: f32,
}

/// 护盾标记
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct CombatShield;

/// 开关 - 由宿主（玩家、AI）控制的开/关状态
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Flickable {
    pub switch_on: bool,
}

/// 炮塔建筑
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ShipTurret {
    /// 玩家强制指定的目标
    pub forced_target: Option<Entity>,
}

/// 隐形装置建筑标记
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct CloakingDevice;

/// 网格连接 - 宿主声明该模块属于哪个热网格
///
/// 由 `sync_heat_grid_links` 同步到 `HeatGrids`
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatGridLink {
    pub grid_id: u32,
}
