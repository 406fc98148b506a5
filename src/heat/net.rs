//! 舰船热网络
//!
//! 一个热网络覆盖一组相互连通的热模块，负责：
//! - 按角色分组记录成员句柄
//! - 汇总储热、损耗与容量
//! - 惰性计算储热比例与损耗比例（脏标记缓存）
//! - 散热槽断开时按容量比例归还热量
//!
//! ## 比例计算
//!
//! ratio = clamp(quantity / capacity_raw, 0, 1)，容量 ≤ 0 时为 0
//!
//! 每个比例有独立的脏标记，只由对应的重算路径清除，
//! 任何修改相应数值或容量的操作都会置脏。

use std::collections::HashMap;

use bevy::prelude::*;

use super::flags::HeatRole;
use super::members::HeatMembers;

/// 舰船热网络
#[derive(Debug, Clone)]
pub struct ShipHeatNet {
    /// 网格 ID
    pub grid_id: u32,

    // === 按角色分组的成员 ===
    connectors: Vec<Entity>,
    sources: Vec<Entity>,
    sinks: Vec<Entity>,
    heat_purges: Vec<Entity>,
    shields: Vec<Entity>,
    turrets: Vec<Entity>,
    cloaks: Vec<Entity>,

    /// 注册时决定的角色
    roles: HashMap<Entity, HeatRole>,
    /// 散热槽注册时的容量（成员销毁后仍可正确扣除）
    sink_capacity: HashMap<Entity, f32>,

    // === 汇总数值 ===
    storage_capacity_raw: f32,
    storage_used: f32,
    depletion: f32,
    venting: bool,

    // === 比例缓存 ===
    ratio_dirty: bool,
    depletion_dirty: bool,
    ratio_in_network: f32,
    depletion_ratio: f32,

    #[cfg(test)]
    ratio_recomputes: u32,
    #[cfg(test)]
    depletion_recomputes: u32,
}

impl ShipHeatNet {
    /// 创建空网络
    pub fn new(grid_id: u32) -> Self {
        Self {
            grid_id,
            connectors: Vec::new(),
            sources: Vec::new(),
            sinks: Vec::new(),
            heat_purges: Vec::new(),
            shields: Vec::new(),
            turrets: Vec::new(),
            cloaks: Vec::new(),
            roles: HashMap::new(),
            sink_capacity: HashMap::new(),
            storage_capacity_raw: 0.0,
            storage_used: 0.0,
            depletion: 0.0,
            venting: false,
            ratio_dirty: true,
            depletion_dirty: true,
            ratio_in_network: 0.0,
            depletion_ratio: 0.0,
            #[cfg(test)]
            ratio_recomputes: 0,
            #[cfg(test)]
            depletion_recomputes: 0,
        }
    }

    // ========================================================================
    // 成员注册
    // ========================================================================

    /// 将成员接入网络
    ///
    /// 散热槽的本地热量与损耗并入网络并清零。
    /// 散热槽、热源、管道会先检查是否已在列表中；护盾与炮塔不检查。
    /// 接入的成员正在排热时，整个网络进入排热状态。
    pub fn register<M: HeatMembers + ?Sized>(&mut self, members: &mut M, member: Entity) -> HeatRole {
        let role = HeatRole::from_caps(members.caps(member));

        match role {
            HeatRole::Sink { purge } => {
                if !self.sinks.contains(&member) {
                    self.merge_sink(members, member, purge);
                }
            }
            HeatRole::Turret => self.turrets.push(member),
            HeatRole::Source { cloak } => {
                if !self.sources.contains(&member) {
                    self.sources.push(member);
                    if cloak {
                        self.cloaks.push(member);
                    }
                }
            }
            HeatRole::Shield => self.shields.push(member),
            HeatRole::Connector => {
                if !self.connectors.contains(&member) {
                    self.connectors.push(member);
                }
            }
        }
        // 仍在网络中的成员保留首次注册的角色
        self.roles.entry(member).or_insert(role);

        if members.is_venting(member) {
            self.venting = true;
        }

        role
    }

    fn merge_sink<M: HeatMembers + ?Sized>(&mut self, members: &mut M, member: Entity, purge: bool) {
        let Some(sink) = members.sink(member) else {
            warn!("Heat sink {:?} vanished during register", member);
            return;
        };

        self.storage_capacity_raw += sink.heat_capacity;
        self.add_heat(sink.heat_stored);
        self.add_depletion(sink.depletion);
        members.set_sink_state(member, 0.0, 0.0);

        debug!(
            "grid {} add sink {:?}: heat {} -> {}/{}, depletion {} -> {}",
            self.grid_id,
            member,
            sink.heat_stored,
            self.storage_used,
            self.storage_capacity_raw,
            sink.depletion,
            self.depletion
        );

        self.sinks.push(member);
        self.sink_capacity.insert(member, sink.heat_capacity);
        self.mark_dirty();
        if purge {
            self.heat_purges.push(member);
        }
    }

    /// 将成员移出网络
    ///
    /// 散热槽按 容量 / 网络总容量 的比例取回热量与损耗，
    /// 份额计算必须使用扣除前的总容量。其余角色只做列表移除。
    pub fn deregister<M: HeatMembers + ?Sized>(&mut self, members: &mut M, member: Entity) -> HeatRole {
        let role = self
            .roles
            .get(&member)
            .copied()
            .unwrap_or_else(|| HeatRole::from_caps(members.caps(member)));

        match role {
            HeatRole::Sink { purge } => {
                if self.sinks.contains(&member) {
                    self.split_sink(members, member, purge);
                } else {
                    debug!("grid {} ignores unknown sink {:?}", self.grid_id, member);
                }
            }
            HeatRole::Turret => remove_first(&mut self.turrets, member),
            HeatRole::Source { cloak } => {
                remove_first(&mut self.sources, member);
                if cloak {
                    remove_first(&mut self.cloaks, member);
                }
            }
            HeatRole::Shield => remove_first(&mut self.shields, member),
            HeatRole::Connector => remove_first(&mut self.connectors, member),
        }

        // 护盾与炮塔可能重复注册，全部移除后才丢弃角色记录
        if !self.contains(member) {
            self.roles.remove(&member);
        }

        role
    }

    /// 彻底移出成员，包括重复注册的护盾与炮塔
    pub fn deregister_all<M: HeatMembers + ?Sized>(&mut self, members: &mut M, member: Entity) {
        loop {
            let before = self.occurrences(member);
            if before == 0 {
                break;
            }
            self.deregister(members, member);
            if self.occurrences(member) >= before {
                warn!("grid {} drops inconsistent member {:?}", self.grid_id, member);
                self.strip(members, member);
                break;
            }
        }
    }

    /// 不经角色记录，直接从所有分组中清除
    fn strip<M: HeatMembers + ?Sized>(&mut self, members: &mut M, member: Entity) {
        if self.sinks.contains(&member) {
            let purge = self.heat_purges.contains(&member);
            self.split_sink(members, member, purge);
        }
        for list in [
            &mut self.connectors,
            &mut self.sources,
            &mut self.sinks,
            &mut self.heat_purges,
            &mut self.shields,
            &mut self.turrets,
            &mut self.cloaks,
        ] {
            list.retain(|&e| e != member);
        }
        self.roles.remove(&member);
    }

    fn occurrences(&self, member: Entity) -> usize {
        [
            &self.connectors,
            &self.sources,
            &self.sinks,
            &self.shields,
            &self.turrets,
        ]
        .iter()
        .map(|list| list.iter().filter(|&&e| e == member).count())
        .sum()
    }

    fn split_sink<M: HeatMembers + ?Sized>(&mut self, members: &mut M, member: Entity, purge: bool) {
        let capacity = match self.sink_capacity.get(&member) {
            Some(&capacity) => capacity,
            None => members.sink(member).map_or(0.0, |sink| sink.heat_capacity),
        };

        if self.storage_used.is_nan() {
            warn!("NaN prevented in deregister!");
            self.storage_used = 0.0;
        }

        let heat_share = proportional_share(self.storage_used, capacity, self.storage_capacity_raw);
        let depletion_share = proportional_share(self.depletion, capacity, self.storage_capacity_raw);
        members.set_sink_state(member, heat_share, depletion_share);

        self.remove_heat(heat_share);
        self.remove_depletion(depletion_share);
        remove_first(&mut self.sinks, member);
        self.sink_capacity.remove(&member);
        // 由剩余散热槽的登记容量重新求和，避免浮点残差
        self.storage_capacity_raw = self.sink_capacity.values().sum();

        debug!(
            "grid {} remove sink {:?}: takes heat {} depletion {}, left {}/{}",
            self.grid_id, member, heat_share, depletion_share, self.storage_used, self.storage_capacity_raw
        );

        self.mark_dirty();
        if purge {
            remove_first(&mut self.heat_purges, member);
        }
    }

    // ========================================================================
    // 热量与损耗
    // ========================================================================

    pub fn add_heat(&mut self, amount: f32) {
        self.storage_used = sanitize_accumulator(self.storage_used + amount, "AddHeat");
        self.ratio_dirty = true;
    }

    pub fn remove_heat(&mut self, amount: f32) {
        self.storage_used = sanitize_accumulator(self.storage_used - amount, "RemoveHeat");
        self.ratio_dirty = true;
    }

    pub fn add_depletion(&mut self, amount: f32) {
        self.depletion = sanitize_accumulator(self.depletion + amount, "AddDepletion");
        self.depletion_dirty = true;
    }

    pub fn remove_depletion(&mut self, amount: f32) {
        self.depletion = sanitize_accumulator(self.depletion - amount, "RemoveDepletion");
        self.depletion_dirty = true;
    }

    // ========================================================================
    // 派生比例（惰性缓存）
    // ========================================================================

    /// 储热比例 [0, 1]
    pub fn ratio_in_network(&mut self) -> f32 {
        if self.ratio_dirty {
            #[cfg(test)]
            {
                self.ratio_recomputes += 1;
            }

            if self.storage_used.is_nan() {
                warn!("NaN prevented in RatioInNetwork!");
                self.storage_used = 0.0;
            }

            self.ratio_in_network = if self.normalized_capacity() <= 0.0 {
                0.0
            } else {
                (self.storage_used / self.storage_capacity_raw).clamp(0.0, 1.0)
            };
            self.ratio_dirty = false;
        }
        self.ratio_in_network
    }

    /// 损耗比例 [0, 1]
    pub fn depletion_ratio(&mut self) -> f32 {
        if self.depletion_dirty {
            #[cfg(test)]
            {
                self.depletion_recomputes += 1;
            }

            if self.depletion.is_nan() {
                warn!("NaN prevented in DepletionRatio!");
                self.depletion = 0.0;
            }

            self.depletion_ratio = if self.depletion <= 0.0 || self.normalized_capacity() <= 0.0 {
                0.0
            } else {
                (self.depletion / self.storage_capacity_raw).clamp(0.0, 1.0)
            };
            self.depletion_dirty = false;
        }
        self.depletion_ratio
    }

    /// 扣除损耗后的有效容量
    pub fn storage_capacity(&mut self) -> f32 {
        self.storage_capacity_raw * (1.0 - self.depletion_ratio())
    }

    /// 负容量或 NaN 容量归零
    fn normalized_capacity(&mut self) -> f32 {
        if !(self.storage_capacity_raw > 0.0) {
            if self.storage_capacity_raw.is_nan() {
                warn!("NaN prevented in StorageCapacityRaw!");
            }
            self.storage_capacity_raw = 0.0;
        }
        self.storage_capacity_raw
    }

    fn mark_dirty(&mut self) {
        self.ratio_dirty = true;
        self.depletion_dirty = true;
    }

    // ========================================================================
    // 护盾、隐形、炮塔
    // ========================================================================

    pub fn any_shield_on<M: HeatMembers + ?Sized>(&self, members: &M) -> bool {
        self.shields.iter().any(|&shield| members.switch_on(shield))
    }

    pub fn any_cloak_on<M: HeatMembers + ?Sized>(&self, members: &M) -> bool {
        self.cloaks.iter().any(|&cloak| members.switch_on(cloak))
    }

    pub fn shields_on<M: HeatMembers + ?Sized>(&self, members: &mut M) {
        for &shield in &self.shields {
            members.set_switch(shield, true);
        }
    }

    pub fn shields_off<M: HeatMembers + ?Sized>(&self, members: &mut M) {
        for &shield in &self.shields {
            members.set_switch(shield, false);
        }
    }

    /// 清除所有炮塔的强制目标
    pub fn turrets_off<M: HeatMembers + ?Sized>(&self, members: &mut M) {
        for &turret in &self.turrets {
            members.reset_forced_target(turret);
        }
    }

    // ========================================================================
    // 排热
    // ========================================================================

    pub fn start_vent<M: HeatMembers + ?Sized>(&mut self, members: &mut M) {
        self.propagate_venting(members, true);
    }

    pub fn end_vent<M: HeatMembers + ?Sized>(&mut self, members: &mut M) {
        self.propagate_venting(members, false);
    }

    /// 排热口属于散热槽，随散热槽一起设置
    fn propagate_venting<M: HeatMembers + ?Sized>(&mut self, members: &mut M, venting: bool) {
        self.venting = venting;
        for &member in self
            .sinks
            .iter()
            .chain(&self.shields)
            .chain(&self.turrets)
            .chain(&self.cloaks)
        {
            members.set_venting(member, venting);
        }
    }

    // ========================================================================
    // 查询
    // ========================================================================

    pub fn is_venting(&self) -> bool {
        self.venting
    }

    pub fn storage_used(&self) -> f32 {
        self.storage_used
    }

    pub fn storage_capacity_raw(&self) -> f32 {
        self.storage_capacity_raw
    }

    pub fn depletion(&self) -> f32 {
        self.depletion
    }

    pub fn connectors(&self) -> &[Entity] {
        &self.connectors
    }

    pub fn sources(&self) -> &[Entity] {
        &self.sources
    }

    pub fn sinks(&self) -> &[Entity] {
        &self.sinks
    }

    pub fn heat_purges(&self) -> &[Entity] {
        &self.heat_purges
    }

    pub fn shields(&self) -> &[Entity] {
        &self.shields
    }

    pub fn turrets(&self) -> &[Entity] {
        &self.turrets
    }

    pub fn cloaks(&self) -> &[Entity] {
        &self.cloaks
    }

    /// 成员的注册角色
    pub fn role_of(&self, member: Entity) -> Option<HeatRole> {
        self.roles.get(&member).copied()
    }

    /// 成员是否仍在任一分组中
    pub fn contains(&self, member: Entity) -> bool {
        self.connectors.contains(&member)
            || self.sources.contains(&member)
            || self.sinks.contains(&member)
            || self.shields.contains(&member)
            || self.turrets.contains(&member)
    }

    /// 所有成员（去重，排热口与隐形装置已包含在散热槽与热源中）
    pub fn members(&self) -> Vec<Entity> {
        let mut all: Vec<Entity> = Vec::with_capacity(self.roles.len());
        for &member in self
            .sinks
            .iter()
            .chain(&self.turrets)
            .chain(&self.sources)
            .chain(&self.shields)
            .chain(&self.connectors)
        {
            if !all.contains(&member) {
                all.push(member);
            }
        }
        all
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn force_storage_used(&mut self, value: f32) {
        self.storage_used = value;
    }

    #[cfg(test)]
    pub(crate) fn force_depletion(&mut self, value: f32) {
        self.depletion = value;
        self.depletion_dirty = true;
    }

    #[cfg(test)]
    pub(crate) fn force_capacity_raw(&mut self, value: f32) {
        self.storage_capacity_raw = value;
        self.mark_dirty();
    }
}

/// 累加器清洗：NaN 归零并警告，负数静默归零
pub fn sanitize_accumulator(value: f32, context: &str) -> f32 {
    if value.is_nan() {
        warn!("NaN prevented in {}!", context);
        0.0
    } else if value < 0.0 {
        0.0
    } else {
        value
    }
}

/// 按容量比例计算份额，结果限制在 [0, capacity]
///
/// 总量或总容量非正、非有限时份额为 0。
/// 这里判断的是原始容量而不是扣除损耗后的有效容量，损耗很高的网络仍会把热量分还给离开的散热槽
fn proportional_share(total: f32, capacity: f32, capacity_raw: f32) -> f32 {
    if !(total > 0.0) || !total.is_finite() || !(capacity_raw > 0.0) || !capacity_raw.is_finite() {
        return 0.0;
    }
    let share = total * capacity / capacity_raw;
    if share.is_nan() {
        return 0.0;
    }
    share.clamp(0.0, capacity.max(0.0))
}

/// 移除第一个匹配项
fn remove_first(list: &mut Vec<Entity>, member: Entity) {
    if let Some(pos) = list.iter().position(|&e| e == member) {
        list.remove(pos);
    }
}
