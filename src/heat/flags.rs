/// 热网络成员能力标志位
///
/// 使用 bitflags 描述舰船模块具备的热相关能力，注册时据此一次性决定成员角色
use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HeatCaps: u8 {
        const NONE = 0;

        // === 储热相关 ===
        /// 散热槽（可本地储热，贡献网络容量）
        const SINK = 1 << 0;
        /// 紧急排热口（散热槽子类型）
        const PURGE = 1 << 1;

        // === 产热相关 ===
        /// 热源
        const SOURCE = 1 << 2;
        /// 护盾
        const SHIELD = 1 << 3;

        // === 所属建筑 ===
        /// 所属建筑是炮塔
        const TURRET = 1 << 4;
        /// 所属建筑是隐形装置
        const CLOAK = 1 << 5;
    }
}

impl Default for HeatCaps {
    fn default() -> Self {
        Self::NONE
    }
}

/// 成员在网络中的角色
///
/// 注册时从能力集合中按优先级决定，之后不再重复探测
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeatRole {
    /// 散热槽，`purge` 表示同时属于排热口列表
    Sink { purge: bool },
    /// 炮塔所属的热组件
    Turret,
    /// 热源，`cloak` 表示同时属于隐形装置列表
    Source { cloak: bool },
    /// 护盾
    Shield,
    /// 普通导热管道
    Connector,
}

impl HeatRole {
    /// 按优先级决定角色（先匹配者胜出）：
    /// 散热槽 > 炮塔 > 热源 > 护盾 > 管道
    pub fn from_caps(caps: HeatCaps) -> Self {
        if caps.contains(HeatCaps::SINK) {
            HeatRole::Sink {
                purge: caps.contains(HeatCaps::PURGE),
            }
        } else if caps.contains(HeatCaps::TURRET) {
            HeatRole::Turret
        } else if caps.contains(HeatCaps::SOURCE) {
            HeatRole::Source {
                cloak: caps.contains(HeatCaps::CLOAK),
            }
        } else if caps.contains(HeatCaps::SHIELD) {
            HeatRole::Shield
        } else {
            HeatRole::Connector
        }
    }

    /// 是否参与排热状态传播
    pub fn receives_venting(&self) -> bool {
        match self {
            HeatRole::Sink { .. } | HeatRole::Turret | HeatRole::Shield => true,
            HeatRole::Source { cloak } => *cloak,
            HeatRole::Connector => false,
        }
    }
}
