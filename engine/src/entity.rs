//! Generic entity logic.

use derive_more::Deref;
use hecs::Component;

use crate::{ecs::*, prelude::*};

// Dummy wrapper so we can write impls for it directly instead of deriving a
// trait for hecs::Entity and writing every fn signature twice.
/// Game entity identifier datatype. All the actual contents live in the ECS.
#[derive(
    Copy, Clone, Hash, Eq, Ord, PartialEq, PartialOrd, Debug, Deref,
)]
pub struct Entity(pub(crate) hecs::Entity);

impl Entity {
    pub(crate) fn get<T>(&self, r: &impl AsRef<Runtime>) -> T
    where
        T: Component + Clone + Default,
    {
        let r = r.as_ref();
        r.ecs
            .get::<&T>(**self)
            .map(|c| (*c).clone())
            .unwrap_or_default()
    }

    pub(crate) fn set<T>(&self, r: &mut impl AsMut<Runtime>, val: T)
    where
        T: Component + Default + PartialEq,
    {
        let r = r.as_mut();
        if val == T::default() {
            // Remove default values, abstraction layer assumes components
            // are always present but defaulted.
            //
            // Will give an error if the component wasn't there to begin
            // with, just ignore that.
            let _ = r.ecs.remove_one::<T>(**self);
        } else {
            r.ecs.insert_one(**self, val).expect("Entity::set failed");
        }
    }

    /// Access a component using a closure.
    ///
    /// Use for complex components that aren't just atomic values.
    pub(crate) fn with<T: Component + Default, U>(
        &self,
        r: &impl AsRef<Runtime>,
        f: impl Fn(&T) -> U,
    ) -> U {
        let r = r.as_ref();
        let scratch = T::default();
        if let Ok(c) = r.ecs.get::<&T>(**self) {
            f(&c)
        } else {
            f(&scratch)
        }
    }

    /// Access and mutate a component using a closure.
    ///
    /// Use for complex components that aren't just atomic values.
    pub(crate) fn with_mut<T: Component + Default + Eq, U>(
        &self,
        r: &mut impl AsMut<Runtime>,
        mut f: impl FnMut(&mut T) -> U,
    ) -> U {
        let r = r.as_mut();
        let mut delete = false;
        let mut insert = false;
        let ret;

        let mut scratch = T::default();
        if let Ok(query) = r.ecs.query_one_mut::<&mut T>(**self) {
            ret = f(&mut *query);
            // We created a default value once, reuse it here.
            if *query == scratch {
                delete = true;
            }
        } else {
            ret = f(&mut scratch);
            if scratch != T::default() {
                insert = true;
            }
        }

        if delete {
            // Component became default value, remove from ECS.
            let _ = r.ecs.remove_one::<T>(**self);
        } else if insert {
            // Scratch component became a valid value.
            r.ecs
                .insert_one(**self, scratch)
                .expect("Entity::with_mut failed to set entity");
        }

        ret
    }

    pub fn loc(&self, r: &impl AsRef<Runtime>) -> Option<IVec2> {
        let r = r.as_ref();
        r.placement.entity_pos(self)
    }

    pub(crate) fn place(&self, r: &mut impl AsMut<Runtime>, pos: IVec2) {
        let r = r.as_mut();
        if Some(pos) != self.loc(r) {
            r.placement.remove(self);
            r.placement.insert(pos, *self);
        }
    }

    pub fn is_alive(&self, r: &impl AsRef<Runtime>) -> bool {
        self.loc(r).is_some()
    }

    pub fn is_player(&self, r: &impl AsRef<Runtime>) -> bool {
        r.as_ref().player == Some(*self)
    }

    pub fn is_mob(&self, r: &impl AsRef<Runtime>) -> bool {
        self.get::<IsMob>(r).0
    }

    pub fn name(&self, r: &impl AsRef<Runtime>) -> String {
        if self.is_player(r) {
            "you".into()
        } else {
            self.get::<Name>(r).0
        }
    }

    /// Name as a sentence subject, "You" for the player.
    pub(crate) fn subject(&self, r: &impl AsRef<Runtime>) -> String {
        if self.is_player(r) {
            "You".into()
        } else {
            format!("The {}", self.get::<Name>(r).0)
        }
    }

    /// Name as a sentence object, "you" for the player.
    pub(crate) fn object(&self, r: &impl AsRef<Runtime>) -> String {
        if self.is_player(r) {
            "you".into()
        } else {
            format!("the {}", self.get::<Name>(r).0)
        }
    }

    /// Present-tense verb ending matching the subject.
    pub(crate) fn verb_s(&self, r: &impl AsRef<Runtime>) -> &'static str {
        if self.is_player(r) {
            ""
        } else {
            "s"
        }
    }

    /// Displayed glyph, conditions may override the base icon.
    pub fn icon(&self, r: &impl AsRef<Runtime>) -> char {
        if let Some(c) = self.condition_icon(r) {
            return c;
        }
        match self.get::<Icon>(r) {
            Icon('\0') => '?',
            Icon(c) => c,
        }
    }

    /// Effective action cost in ticks, conditions mutate this directly.
    pub fn speed(&self, r: &impl AsRef<Runtime>) -> i64 {
        match self.get::<Speed>(r).0 {
            0 => NORMAL_SPEED,
            s => s,
        }
    }

    pub fn hp(&self, r: &impl AsRef<Runtime>) -> Hp {
        self.get::<Hp>(r)
    }

    pub fn stats(&self, r: &impl AsRef<Runtime>) -> Stats {
        self.get::<Stats>(r)
    }

    pub(crate) fn special(
        &self,
        r: &impl AsRef<Runtime>,
    ) -> Option<SpecialAttack> {
        let r = r.as_ref();
        r.ecs.get::<&SpecialAttack>(**self).ok().map(|c| (*c).clone())
    }

    /// Ability cards currently available for use.
    pub fn hand(&self, r: &impl AsRef<Runtime>) -> Vec<Ability> {
        self.get::<Hand>(r).0
    }

    /// Whether the actor could step into the cell right now.
    pub fn can_enter(&self, r: &impl AsRef<Runtime>, pos: IVec2) -> bool {
        let r = r.as_ref();
        r.terrain.get(pos).is_passable() && r.placement.entity_at(pos).is_none()
    }
}
