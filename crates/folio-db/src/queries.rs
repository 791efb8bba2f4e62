use chrono::{DateTime, NaiveDateTime, Utc};
use folio_types::models::{Comment, CommentView, Project, ProjectSummary, PublicUser};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::models::{LikeToggle, ProjectFields, ProjectRow, UserRow};
use crate::{Database, Result};

/// Projects joined with owner nickname and aggregate counters for one viewer.
/// `?1` is the viewer's handle (NULL for anonymous, which never matches).
/// Likes and comments are joined independently, so counts use DISTINCT to
/// cancel the fan-out.
const PROJECT_SUMMARY_SELECT: &str = "
    SELECT p.id, p.title, p.user_id, p.url, p.thumbnail, p.description, p.created_at,
           u.nickname,
           COUNT(DISTINCT l2.id) AS like_count,
           COUNT(DISTINCT c.id) AS comment_count,
           COUNT(l.id) > 0 AS liked
    FROM projects p
    JOIN users u ON p.user_id = u.user_id
    LEFT JOIN likes l ON l.project_id = p.id AND l.user_id = ?1
    LEFT JOIN likes l2 ON l2.project_id = p.id
    LEFT JOIN comments c ON c.project_id = p.id";

const PROJECT_COLUMNS: &str =
    "id, title, user_id, url, thumbnail, description, created_at";

impl Database {
    // -- Users --

    pub fn username_exists(&self, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE user_id = ?1)",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    pub fn nickname_exists(&self, nickname: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE nickname = ?1)",
                [nickname],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    /// Fails with `DbError::Conflict` when the handle or nickname is taken.
    pub fn create_user(
        &self,
        user_id: &str,
        password_hash: &str,
        nickname: &str,
    ) -> Result<PublicUser> {
        self.with_conn(|conn| {
            let user = conn.query_row(
                "INSERT INTO users (user_id, password, nickname) VALUES (?1, ?2, ?3)
                 RETURNING id, user_id, nickname",
                params![user_id, password_hash, nickname],
                |row| {
                    Ok(PublicUser {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        nickname: row.get(2)?,
                    })
                },
            )?;
            Ok(user)
        })
    }

    pub fn get_user_by_username(&self, user_id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let user = conn
                .query_row(
                    "SELECT id, user_id, password, nickname, created_at FROM users WHERE user_id = ?1",
                    [user_id],
                    |row| {
                        Ok(UserRow {
                            id: row.get(0)?,
                            user_id: row.get(1)?,
                            password: row.get(2)?,
                            nickname: row.get(3)?,
                            created_at: timestamp(row, 4)?,
                        })
                    },
                )
                .optional()?;
            Ok(user)
        })
    }

    // -- Projects --

    pub fn project_exists(&self, title: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM projects WHERE title = ?1 AND user_id = ?2)",
                [title, user_id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    /// True if some project still owns the object stored under `key`. A
    /// renamed project keeps its original key, so this can hold even when no
    /// project has the matching title any more.
    pub fn thumbnail_key_in_use(&self, key: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let in_use = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM projects WHERE thumbnail_key = ?1)",
                [key],
                |row| row.get(0),
            )?;
            Ok(in_use)
        })
    }

    pub fn create_project(
        &self,
        fields: &ProjectFields<'_>,
        thumbnail_key: Option<&str>,
    ) -> Result<Project> {
        self.with_conn(|conn| {
            let sql = format!(
                "INSERT INTO projects (title, user_id, url, thumbnail, thumbnail_key, description)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 RETURNING {PROJECT_COLUMNS}"
            );
            let project = conn.query_row(
                &sql,
                params![
                    fields.title,
                    fields.user_id,
                    fields.url,
                    fields.thumbnail,
                    thumbnail_key,
                    fields.description,
                ],
                project_from_row,
            )?;
            Ok(project)
        })
    }

    /// Newest first, as seen by `viewer` (None for anonymous).
    pub fn list_projects(&self, viewer: Option<&str>) -> Result<Vec<ProjectSummary>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{PROJECT_SUMMARY_SELECT}
                 GROUP BY p.id
                 ORDER BY p.created_at DESC, p.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![viewer], summary_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_project_summary(
        &self,
        id: i64,
        viewer: Option<&str>,
    ) -> Result<Option<ProjectSummary>> {
        self.with_conn(|conn| query_project_summary(conn, id, viewer))
    }

    pub fn get_project(&self, id: i64) -> Result<Option<ProjectRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {PROJECT_COLUMNS}, thumbnail_key FROM projects WHERE id = ?1");
            let row = conn
                .query_row(&sql, [id], |row| {
                    Ok(ProjectRow {
                        project: project_from_row(row)?,
                        thumbnail_key: row.get(7)?,
                    })
                })
                .optional()?;
            Ok(row)
        })
    }

    /// Overwrites every client-editable column. Returns None if no such project.
    pub fn update_project(&self, id: i64, fields: &ProjectFields<'_>) -> Result<Option<Project>> {
        self.with_conn(|conn| {
            let sql = format!(
                "UPDATE projects
                 SET title = ?1, user_id = ?2, url = ?3, thumbnail = ?4, description = ?5
                 WHERE id = ?6
                 RETURNING {PROJECT_COLUMNS}"
            );
            let project = conn
                .query_row(
                    &sql,
                    params![
                        fields.title,
                        fields.user_id,
                        fields.url,
                        fields.thumbnail,
                        fields.description,
                        id,
                    ],
                    project_from_row,
                )
                .optional()?;
            Ok(project)
        })
    }

    /// Returns false if no such project. Likes and comments go with it.
    pub fn delete_project(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM projects WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    // -- Likes --

    /// Toggle `user_id`'s like on a project from stored state: removes it if
    /// present, inserts it if not, all in one transaction.
    /// Returns None if the project does not exist.
    pub fn toggle_like(&self, user_id: &str, project_id: i64) -> Result<Option<LikeToggle>> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;

            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM projects WHERE id = ?1)",
                [project_id],
                |row| row.get(0),
            )?;
            if !exists {
                return Ok(None);
            }

            let removed = tx.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND project_id = ?2",
                params![user_id, project_id],
            )?;
            if removed == 0 {
                tx.execute(
                    "INSERT INTO likes (user_id, project_id) VALUES (?1, ?2)",
                    params![user_id, project_id],
                )?;
            }

            let project = query_project_summary(&tx, project_id, Some(user_id))?;
            tx.commit()?;

            Ok(project.map(|project| LikeToggle {
                liked: removed == 0,
                project,
            }))
        })
    }

    // -- Comments --

    pub fn create_comment(&self, user_id: &str, project_id: i64, content: &str) -> Result<Comment> {
        self.with_conn(|conn| {
            let comment = conn.query_row(
                "INSERT INTO comments (user_id, project_id, content) VALUES (?1, ?2, ?3)
                 RETURNING id, user_id, project_id, content, created_at",
                params![user_id, project_id, content],
                |row| {
                    Ok(Comment {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        project_id: row.get(2)?,
                        content: row.get(3)?,
                        created_at: timestamp(row, 4)?,
                    })
                },
            )?;
            Ok(comment)
        })
    }

    /// Newest first, joined with the author's nickname.
    pub fn list_comments(&self, project_id: i64) -> Result<Vec<CommentView>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.content, c.created_at, u.user_id, u.nickname
                 FROM comments c
                 JOIN users u ON c.user_id = u.user_id
                 WHERE c.project_id = ?1
                 ORDER BY c.created_at DESC, c.id DESC",
            )?;
            let rows = stmt
                .query_map([project_id], |row| {
                    Ok(CommentView {
                        id: row.get(0)?,
                        content: row.get(1)?,
                        created_at: timestamp(row, 2)?,
                        user_id: row.get(3)?,
                        nickname: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn delete_comment(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM comments WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }
}

fn query_project_summary(
    conn: &Connection,
    id: i64,
    viewer: Option<&str>,
) -> Result<Option<ProjectSummary>> {
    let sql = format!(
        "{PROJECT_SUMMARY_SELECT}
         WHERE p.id = ?2
         GROUP BY p.id"
    );
    let row = conn
        .query_row(&sql, params![viewer, id], summary_from_row)
        .optional()?;
    Ok(row)
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        title: row.get(1)?,
        user_id: row.get(2)?,
        url: row.get(3)?,
        thumbnail: row.get(4)?,
        description: row.get(5)?,
        created_at: timestamp(row, 6)?,
    })
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<ProjectSummary> {
    Ok(ProjectSummary {
        project: project_from_row(row)?,
        nickname: row.get(7)?,
        like_count: row.get(8)?,
        comment_count: row.get(9)?,
        liked: row.get(10)?,
    })
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS[.fff]" without timezone.
/// Parse as naive UTC.
fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f")
        .map(|ndt| ndt.and_utc())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
