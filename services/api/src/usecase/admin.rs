//! Admin panel use cases: stats, backend report/toggle, external API
//! probes, and user management with self-modification guards.

use cinelink_domain::user::UserRole;

use crate::config::{BackendFlag, StorageBackend};
use crate::domain::repository::{
    BackendInspectPort, FavoriteRepository, LinkRepository, MovieCatalogPort, ReviewRepository,
    UserRepository,
};
use crate::domain::types::{ApiReport, BackendReport, StorageStats, User};
use crate::error::ApiError;

// ── Stats ────────────────────────────────────────────────────────────────────

pub struct StatsUseCase<U, L, R, F>
where
    U: UserRepository,
    L: LinkRepository,
    R: ReviewRepository,
    F: FavoriteRepository,
{
    pub users: U,
    pub links: L,
    pub reviews: R,
    pub favorites: F,
}

impl<U, L, R, F> StatsUseCase<U, L, R, F>
where
    U: UserRepository,
    L: LinkRepository,
    R: ReviewRepository,
    F: FavoriteRepository,
{
    pub async fn execute(&self) -> Result<StorageStats, ApiError> {
        Ok(StorageStats {
            users: self.users.count().await?,
            links: self.links.count().await?,
            reviews: self.reviews.count().await?,
            favorites: self.favorites.count().await?,
        })
    }
}

// ── Backend report ───────────────────────────────────────────────────────────

pub struct BackendReportUseCase<B: BackendInspectPort> {
    pub inspector: B,
}

impl<B: BackendInspectPort> BackendReportUseCase<B> {
    pub async fn execute(&self) -> Result<BackendReport, ApiError> {
        self.inspector.report().await
    }
}

// ── External API status ──────────────────────────────────────────────────────

pub struct ApiStatusUseCase<M: MovieCatalogPort> {
    pub movies: M,
}

impl<M: MovieCatalogPort> ApiStatusUseCase<M> {
    pub async fn execute(&self) -> Vec<ApiReport> {
        self.movies.probe().await
    }
}

// ── Backend toggle ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub new_backend: StorageBackend,
    /// True when the process runs supervised and will exit for a restart;
    /// false means the operator has to restart by hand.
    pub auto_restart: bool,
}

pub struct ToggleBackendUseCase {
    pub flag: BackendFlag,
    pub supervised: bool,
}

impl ToggleBackendUseCase {
    /// Persist the flipped selection. The running process keeps serving from
    /// the OLD backend; only a restart picks the new one up — the caller is
    /// responsible for exiting after the response when `auto_restart`.
    pub fn execute(&self, current: StorageBackend) -> Result<ToggleOutcome, ApiError> {
        let new_backend = current.toggled();
        self.flag.store(new_backend)?;
        Ok(ToggleOutcome {
            new_backend,
            auto_restart: self.supervised,
        })
    }
}

// ── User management ──────────────────────────────────────────────────────────

pub struct ListUsersUseCase<U: UserRepository> {
    pub repo: U,
}

impl<U: UserRepository> ListUsersUseCase<U> {
    pub async fn execute(&self) -> Result<Vec<User>, ApiError> {
        self.repo.find_all().await
    }
}

#[derive(Debug, Clone)]
pub struct UpdateUserInput {
    pub email: String,
    pub role: UserRole,
}

pub struct UpdateUserUseCase<U: UserRepository> {
    pub repo: U,
}

impl<U: UserRepository> UpdateUserUseCase<U> {
    pub async fn execute(
        &self,
        actor_username: &str,
        target_id: &str,
        input: UpdateUserInput,
    ) -> Result<User, ApiError> {
        let Some(target) = self.repo.find_by_id(target_id).await? else {
            return Err(ApiError::UserNotFound);
        };
        // Admins cannot demote (or re-promote) themselves; a lockout needs
        // a second admin.
        if target.username == actor_username && input.role != target.role {
            return Err(ApiError::OwnRoleChange);
        }
        if self.repo.email_taken(&input.email, Some(target_id)).await? {
            return Err(ApiError::EmailInUse);
        }
        self.repo
            .update_email_role(target_id, &input.email, input.role)
            .await?
            .ok_or(ApiError::UserNotFound)
    }
}

pub struct DeleteUserUseCase<U: UserRepository> {
    pub repo: U,
}

impl<U: UserRepository> DeleteUserUseCase<U> {
    pub async fn execute(&self, actor_username: &str, target_id: &str) -> Result<(), ApiError> {
        let Some(target) = self.repo.find_by_id(target_id).await? else {
            return Err(ApiError::UserNotFound);
        };
        if target.username == actor_username {
            return Err(ApiError::OwnAccountDelete);
        }
        if !self.repo.delete_cascade(target_id).await? {
            return Err(ApiError::UserNotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::Utc;

    use crate::domain::types::{NewUser, User};

    struct MockUserRepo {
        users: Mutex<Vec<User>>,
        deleted: Mutex<Vec<String>>,
    }

    impl MockUserRepo {
        fn with(users: Vec<User>) -> Self {
            Self {
                users: Mutex::new(users),
                deleted: Mutex::new(Vec::new()),
            }
        }
    }

    fn user(id: &str, username: &str, email: &str, role: UserRole) -> User {
        User {
            id: id.into(),
            username: username.into(),
            email: email.into(),
            password_hash: "$argon2id$test".into(),
            role,
            created_at: Utc::now(),
        }
    }

    impl UserRepository for MockUserRepo {
        async fn find_all(&self) -> Result<Vec<User>, ApiError> {
            Ok(self.users.lock().unwrap().clone())
        }
        async fn find_by_id(&self, id: &str) -> Result<Option<User>, ApiError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.id == id)
                .cloned())
        }
        async fn find_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.username == username)
                .cloned())
        }
        async fn username_exists(&self, username: &str) -> Result<bool, ApiError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .any(|u| u.username == username))
        }
        async fn email_taken(
            &self,
            email: &str,
            exclude_id: Option<&str>,
        ) -> Result<bool, ApiError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .any(|u| u.email == email && Some(u.id.as_str()) != exclude_id))
        }
        async fn create(&self, _user: NewUser) -> Result<User, ApiError> {
            unreachable!("not used by admin use cases")
        }
        async fn update_email_role(
            &self,
            id: &str,
            email: &str,
            role: UserRole,
        ) -> Result<Option<User>, ApiError> {
            let mut users = self.users.lock().unwrap();
            let Some(target) = users.iter_mut().find(|u| u.id == id) else {
                return Ok(None);
            };
            target.email = email.to_owned();
            target.role = role;
            Ok(Some(target.clone()))
        }
        async fn delete_cascade(&self, id: &str) -> Result<bool, ApiError> {
            let mut users = self.users.lock().unwrap();
            let before = users.len();
            users.retain(|u| u.id != id);
            if users.len() == before {
                return Ok(false);
            }
            self.deleted.lock().unwrap().push(id.to_owned());
            Ok(true)
        }
        async fn count(&self) -> Result<u64, ApiError> {
            Ok(self.users.lock().unwrap().len() as u64)
        }
    }

    fn admin_and_user() -> Vec<User> {
        vec![
            user("u-1", "root", "root@example.com", UserRole::Admin),
            user("u-2", "alice", "alice@example.com", UserRole::User),
        ]
    }

    #[tokio::test]
    async fn should_block_changing_own_role() {
        let usecase = UpdateUserUseCase {
            repo: MockUserRepo::with(admin_and_user()),
        };
        let result = usecase
            .execute(
                "root",
                "u-1",
                UpdateUserInput {
                    email: "root@example.com".into(),
                    role: UserRole::User,
                },
            )
            .await;
        assert!(matches!(result, Err(ApiError::OwnRoleChange)));
    }

    #[tokio::test]
    async fn should_allow_changing_own_email_keeping_role() {
        let usecase = UpdateUserUseCase {
            repo: MockUserRepo::with(admin_and_user()),
        };
        let updated = usecase
            .execute(
                "root",
                "u-1",
                UpdateUserInput {
                    email: "new-root@example.com".into(),
                    role: UserRole::Admin,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email, "new-root@example.com");
        assert_eq!(updated.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn should_reject_email_belonging_to_another_user() {
        let usecase = UpdateUserUseCase {
            repo: MockUserRepo::with(admin_and_user()),
        };
        let result = usecase
            .execute(
                "root",
                "u-2",
                UpdateUserInput {
                    email: "root@example.com".into(),
                    role: UserRole::User,
                },
            )
            .await;
        assert!(matches!(result, Err(ApiError::EmailInUse)));
    }

    #[tokio::test]
    async fn should_promote_other_user_to_admin() {
        let usecase = UpdateUserUseCase {
            repo: MockUserRepo::with(admin_and_user()),
        };
        let updated = usecase
            .execute(
                "root",
                "u-2",
                UpdateUserInput {
                    email: "alice@example.com".into(),
                    role: UserRole::Admin,
                },
            )
            .await
            .unwrap();
        assert!(updated.role.is_admin());
    }

    #[tokio::test]
    async fn should_block_deleting_own_account() {
        let usecase = DeleteUserUseCase {
            repo: MockUserRepo::with(admin_and_user()),
        };
        let result = usecase.execute("root", "u-1").await;
        assert!(matches!(result, Err(ApiError::OwnAccountDelete)));
    }

    #[tokio::test]
    async fn should_delete_other_user() {
        let usecase = DeleteUserUseCase {
            repo: MockUserRepo::with(admin_and_user()),
        };
        usecase.execute("root", "u-2").await.unwrap();
        assert_eq!(usecase.repo.deleted.lock().unwrap().as_slice(), ["u-2"]);
    }

    #[tokio::test]
    async fn should_return_not_found_for_missing_target() {
        let usecase = DeleteUserUseCase {
            repo: MockUserRepo::with(admin_and_user()),
        };
        let result = usecase.execute("root", "u-9").await;
        assert!(matches!(result, Err(ApiError::UserNotFound)));
    }

    #[test]
    fn should_persist_toggled_backend_and_report_restart_mode() {
        let dir = tempfile::tempdir().unwrap();
        let flag = BackendFlag::new(dir.path());

        let manual = ToggleBackendUseCase {
            flag: flag.clone(),
            supervised: false,
        };
        let outcome = manual.execute(StorageBackend::Database).unwrap();
        assert_eq!(outcome.new_backend, StorageBackend::JsonFiles);
        assert!(!outcome.auto_restart);
        assert_eq!(flag.load().unwrap(), StorageBackend::JsonFiles);

        let supervised = ToggleBackendUseCase {
            flag: flag.clone(),
            supervised: true,
        };
        let outcome = supervised.execute(StorageBackend::JsonFiles).unwrap();
        assert_eq!(outcome.new_backend, StorageBackend::Database);
        assert!(outcome.auto_restart);
        assert_eq!(flag.load().unwrap(), StorageBackend::Database);
    }
}
