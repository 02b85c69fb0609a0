//! Users and course users of the active course

use serde_json::Value;
use tracing::debug;

use super::{hydrate, update_keyed, StoreConfig, StoreError, StoreResult};
use crate::entities::{CourseUser, Entity, MergedUser, User};
use crate::model::Record;

fn username_key(user: &User) -> String {
    user.username().to_owned()
}

/// Cache of users keyed by username and course users keyed by
/// `course_user_id`. Keys are unique within each list.
#[derive(Debug, Clone, Default)]
pub struct UserStore {
    config: StoreConfig,
    users: Vec<User>,
    course_users: Vec<CourseUser>,
}

impl UserStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn course_users(&self) -> &[CourseUser] {
        &self.course_users
    }

    /// Replaces the cached users. Returns how many were kept.
    pub fn set_users(&mut self, records: &[Value]) -> StoreResult<usize> {
        self.users = hydrate(User::NAME, records, &self.config, User::new, username_key)?;
        Ok(self.users.len())
    }

    pub fn find_user(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username() == username)
    }

    pub fn find_user_by_id(&self, user_id: u64) -> Option<&User> {
        self.users.iter().find(|u| u.user_id() == user_id)
    }

    pub fn add_user(&mut self, input: &Record) -> StoreResult<&User> {
        let user = User::new(input)?;
        if self.find_user(user.username()).is_some() {
            return Err(StoreError::duplicate(User::NAME, user.username()));
        }
        debug!(username = user.username(), "adding user");
        self.users.push(user);
        Ok(&self.users[self.users.len() - 1])
    }

    /// Applies `partial` to the user. Renaming onto another cached
    /// username fails with `Duplicate`.
    pub fn update_user(&mut self, username: &str, partial: &Record) -> StoreResult<&User> {
        let index = self
            .users
            .iter()
            .position(|u| u.username() == username)
            .ok_or_else(|| StoreError::not_found(User::NAME, username))?;
        update_keyed(User::NAME, &mut self.users, index, username_key, |u| u.set(partial))?;
        debug!(username, "updated user");
        Ok(&self.users[index])
    }

    pub fn remove_user(&mut self, username: &str) -> StoreResult<User> {
        let index = self
            .users
            .iter()
            .position(|u| u.username() == username)
            .ok_or_else(|| StoreError::not_found(User::NAME, username))?;
        debug!(username, "removing user");
        Ok(self.users.remove(index))
    }

    /// Replaces the cached course users. Returns how many were kept.
    pub fn set_course_users(&mut self, records: &[Value]) -> StoreResult<usize> {
        self.course_users = hydrate(
            CourseUser::NAME,
            records,
            &self.config,
            CourseUser::new,
            CourseUser::course_user_id,
        )?;
        Ok(self.course_users.len())
    }

    pub fn find_course_user(&self, course_user_id: u64) -> Option<&CourseUser> {
        self.course_users
            .iter()
            .find(|cu| cu.course_user_id() == course_user_id)
    }

    pub fn add_course_user(&mut self, input: &Record) -> StoreResult<&CourseUser> {
        let course_user = CourseUser::new(input)?;
        if self.find_course_user(course_user.course_user_id()).is_some() {
            return Err(StoreError::duplicate(CourseUser::NAME, course_user.course_user_id()));
        }
        debug!(course_user_id = course_user.course_user_id(), "adding course user");
        self.course_users.push(course_user);
        Ok(&self.course_users[self.course_users.len() - 1])
    }

    pub fn update_course_user(&mut self, course_user_id: u64, partial: &Record) -> StoreResult<&CourseUser> {
        let index = self.course_user_index(course_user_id)?;
        update_keyed(
            CourseUser::NAME,
            &mut self.course_users,
            index,
            CourseUser::course_user_id,
            |cu| cu.set(partial),
        )?;
        debug!(course_user_id, "updated course user");
        Ok(&self.course_users[index])
    }

    pub fn remove_course_user(&mut self, course_user_id: u64) -> StoreResult<CourseUser> {
        let index = self.course_user_index(course_user_id)?;
        debug!(course_user_id, "removing course user");
        Ok(self.course_users.remove(index))
    }

    fn course_user_index(&self, course_user_id: u64) -> StoreResult<usize> {
        self.course_users
            .iter()
            .position(|cu| cu.course_user_id() == course_user_id)
            .ok_or_else(|| StoreError::not_found(CourseUser::NAME, course_user_id))
    }

    /// Joins each course user with its user by `user_id`. Course users
    /// without a cached user are left out.
    pub fn merged_users(&self) -> StoreResult<Vec<MergedUser>> {
        self.course_users
            .iter()
            .filter_map(|cu| self.find_user_by_id(cu.user_id()).map(|user| (user, cu)))
            .map(|(user, cu)| {
                let mut record = user.to_object();
                record.extend(cu.to_object());
                MergedUser::new(&record).map_err(StoreError::from)
            })
            .collect()
    }
}
