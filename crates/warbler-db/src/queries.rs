use rusqlite::{Connection, Params, Row, params};
use uuid::Uuid;

use warbler_types::models::{DEFAULT_HEADER_IMAGE_URL, DEFAULT_IMAGE_URL};

use crate::models::{
    AuthoredMessageRow, FollowRow, LikeRow, MessageRow, NewMessage, NewUser, UserRow, UserUpdate,
};
use crate::{Database, DbError, Result};

const USER_COLUMNS: &str = "u.id, u.email, u.username, u.image_url, u.header_image_url, \
                            u.bio, u.location, u.password, u.created_at";

const AUTHORED_MESSAGES: &str = "SELECT m.id, m.text, m.timestamp, m.user_id,
                                        u.username, u.image_url
                                 FROM messages m
                                 JOIN users u ON u.id = m.user_id";

impl Database {
    // -- Users --

    pub fn insert_user(&self, user: &NewUser) -> Result<UserRow> {
        self.with_conn(|conn| insert_user(conn, user))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    /// All users, or those whose username contains `search` (case-insensitive).
    pub fn list_users(&self, search: Option<&str>) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| query_users(conn, search))
    }

    pub fn update_user(&self, id: &str, update: &UserUpdate) -> Result<UserRow> {
        self.with_conn(|conn| update_user(conn, id, update))
    }

    /// Deletes the user; their messages, follows and likes go with them.
    pub fn delete_user(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM users WHERE id = ?1", [id])? > 0))
    }

    pub fn count_users(&self) -> Result<u64> {
        self.with_conn(|conn| count(conn, "SELECT COUNT(*) FROM users", []))
    }

    // -- Messages --

    pub fn insert_message(&self, message: &NewMessage) -> Result<MessageRow> {
        self.with_conn(|conn| insert_message(conn, message))
    }

    pub fn get_message(&self, id: &str) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| query_message(conn, id))
    }

    pub fn get_authored_message(&self, id: &str) -> Result<Option<AuthoredMessageRow>> {
        self.with_conn(|conn| {
            let sql = format!("{AUTHORED_MESSAGES} WHERE m.id = ?1");
            conn.query_row(&sql, [id], authored_message_from_row)
                .optional()
        })
    }

    /// The user who owns a message.
    pub fn message_owner(&self, message_id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users u
                 JOIN messages m ON m.user_id = u.id
                 WHERE m.id = ?1"
            );
            conn.query_row(&sql, [message_id], user_from_row).optional()
        })
    }

    /// A user's messages, newest first.
    pub fn messages_for_user(&self, user_id: &str, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, text, timestamp, user_id FROM messages
                 WHERE user_id = ?1
                 ORDER BY timestamp DESC, rowid DESC
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![user_id, limit], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Same as `messages_for_user`, joined with the author's display fields.
    pub fn authored_messages_for_user(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<AuthoredMessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{AUTHORED_MESSAGES}
                 WHERE m.user_id = ?1
                 ORDER BY m.timestamp DESC, m.rowid DESC
                 LIMIT ?2"
            );
            query_authored(conn, &sql, params![user_id, limit])
        })
    }

    /// Messages by `user_id` and everyone they follow, newest first.
    pub fn timeline(&self, user_id: &str, limit: u32) -> Result<Vec<AuthoredMessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{AUTHORED_MESSAGES}
                 WHERE m.user_id = ?1
                    OR m.user_id IN (SELECT user_being_followed_id FROM follows
                                     WHERE user_following_id = ?1)
                 ORDER BY m.timestamp DESC, m.rowid DESC
                 LIMIT ?2"
            );
            query_authored(conn, &sql, params![user_id, limit])
        })
    }

    pub fn delete_message(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM messages WHERE id = ?1", [id])? > 0))
    }

    pub fn count_messages(&self) -> Result<u64> {
        self.with_conn(|conn| count(conn, "SELECT COUNT(*) FROM messages", []))
    }

    pub fn count_messages_for_user(&self, user_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            count(conn, "SELECT COUNT(*) FROM messages WHERE user_id = ?1", [user_id])
        })
    }

    // -- Follows --

    /// Record that `follower_id` follows `followed_id`.
    pub fn follow(&self, follower_id: &str, followed_id: &str) -> Result<FollowRow> {
        self.with_conn(|conn| insert_follow(conn, follower_id, followed_id))
    }

    /// Returns false when there was no such edge.
    pub fn unfollow(&self, follower_id: &str, followed_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM follows WHERE user_following_id = ?1 AND user_being_followed_id = ?2",
                [follower_id, followed_id],
            )?;
            Ok(removed > 0)
        })
    }

    /// Users following `user_id`, oldest edge first.
    pub fn followers(&self, user_id: &str) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users u
                 JOIN follows f ON f.user_following_id = u.id
                 WHERE f.user_being_followed_id = ?1
                 ORDER BY f.created_at, f.rowid"
            );
            query_user_list(conn, &sql, [user_id])
        })
    }

    /// Users `user_id` follows, oldest edge first.
    pub fn following(&self, user_id: &str) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users u
                 JOIN follows f ON f.user_being_followed_id = u.id
                 WHERE f.user_following_id = ?1
                 ORDER BY f.created_at, f.rowid"
            );
            query_user_list(conn, &sql, [user_id])
        })
    }

    /// Does `user_id` follow `other_id`?
    pub fn is_following(&self, user_id: &str, other_id: &str) -> Result<bool> {
        self.with_conn(|conn| edge_exists(conn, user_id, other_id))
    }

    /// Is `user_id` followed by `other_id`?
    pub fn is_followed_by(&self, user_id: &str, other_id: &str) -> Result<bool> {
        self.with_conn(|conn| edge_exists(conn, other_id, user_id))
    }

    pub fn count_followers(&self, user_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            count(
                conn,
                "SELECT COUNT(*) FROM follows WHERE user_being_followed_id = ?1",
                [user_id],
            )
        })
    }

    pub fn count_following(&self, user_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            count(conn, "SELECT COUNT(*) FROM follows WHERE user_following_id = ?1", [user_id])
        })
    }

    pub fn count_follows(&self) -> Result<u64> {
        self.with_conn(|conn| count(conn, "SELECT COUNT(*) FROM follows", []))
    }

    // -- Likes --

    /// Toggle a like: removes it if present, inserts it if not.
    /// Returns true when the like now exists.
    pub fn toggle_like(&self, user_id: &str, message_id: &str) -> Result<bool> {
        self.transaction(|tx| {
            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM likes WHERE user_id = ?1 AND message_id = ?2",
                    [user_id, message_id],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(existing_id) = existing {
                tx.execute("DELETE FROM likes WHERE id = ?1", [&existing_id])?;
                Ok(false)
            } else {
                tx.execute(
                    "INSERT INTO likes (id, user_id, message_id) VALUES (?1, ?2, ?3)",
                    params![Uuid::new_v4().to_string(), user_id, message_id],
                )?;
                Ok(true)
            }
        })
    }

    pub fn likes_for_user(&self, user_id: &str) -> Result<Vec<LikeRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, message_id, created_at FROM likes
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(LikeRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        message_id: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Messages `user_id` liked, most recently liked first.
    pub fn liked_messages(&self, user_id: &str) -> Result<Vec<AuthoredMessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{AUTHORED_MESSAGES}
                 JOIN likes l ON l.message_id = m.id
                 WHERE l.user_id = ?1
                 ORDER BY l.created_at DESC, l.rowid DESC"
            );
            query_authored(conn, &sql, [user_id])
        })
    }
}

// -- Connection-level operations, usable inside `Database::transaction` --

pub fn insert_user(conn: &Connection, user: &NewUser) -> Result<UserRow> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO users (id, email, username, password, image_url, header_image_url)
         VALUES (?1, ?2, ?3, ?4, COALESCE(?5, ?6), ?7)",
        params![
            id,
            user.email,
            user.username,
            user.password,
            user.image_url,
            DEFAULT_IMAGE_URL,
            DEFAULT_HEADER_IMAGE_URL,
        ],
    )?;

    query_user_by_id(conn, &id)?.ok_or(DbError::NotFound { entity: "user", id })
}

pub fn insert_message(conn: &Connection, message: &NewMessage) -> Result<MessageRow> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO messages (id, text, user_id) VALUES (?1, ?2, ?3)",
        params![id, message.text, message.user_id],
    )?;

    query_message(conn, &id)?.ok_or(DbError::NotFound {
        entity: "message",
        id,
    })
}

pub fn insert_follow(conn: &Connection, follower_id: &str, followed_id: &str) -> Result<FollowRow> {
    conn.execute(
        "INSERT INTO follows (user_being_followed_id, user_following_id) VALUES (?1, ?2)",
        [followed_id, follower_id],
    )?;

    let row = conn.query_row(
        "SELECT user_being_followed_id, user_following_id, created_at FROM follows
         WHERE user_being_followed_id = ?1 AND user_following_id = ?2",
        [followed_id, follower_id],
        |row| {
            Ok(FollowRow {
                user_being_followed_id: row.get(0)?,
                user_following_id: row.get(1)?,
                created_at: row.get(2)?,
            })
        },
    )?;

    Ok(row)
}

pub fn update_user(conn: &Connection, id: &str, update: &UserUpdate) -> Result<UserRow> {
    let changed = conn.execute(
        "UPDATE users SET
             username = ?2,
             email = ?3,
             image_url = COALESCE(?4, ?8),
             header_image_url = COALESCE(?5, ?9),
             bio = ?6,
             location = ?7
         WHERE id = ?1",
        params![
            id,
            update.username,
            update.email,
            update.image_url,
            update.header_image_url,
            update.bio,
            update.location,
            DEFAULT_IMAGE_URL,
            DEFAULT_HEADER_IMAGE_URL,
        ],
    )?;

    if changed == 0 {
        return Err(DbError::NotFound {
            entity: "user",
            id: id.to_string(),
        });
    }

    query_user_by_id(conn, id)?.ok_or_else(|| DbError::NotFound {
        entity: "user",
        id: id.to_string(),
    })
}

pub fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1");
    conn.query_row(&sql, [id], user_from_row).optional()
}

pub fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.username = ?1");
    conn.query_row(&sql, [username], user_from_row).optional()
}

pub fn query_message(conn: &Connection, id: &str) -> Result<Option<MessageRow>> {
    conn.query_row(
        "SELECT id, text, timestamp, user_id FROM messages WHERE id = ?1",
        [id],
        message_from_row,
    )
    .optional()
}

fn query_users(conn: &Connection, search: Option<&str>) -> Result<Vec<UserRow>> {
    match search {
        Some(term) => {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users u
                 WHERE instr(lower(u.username), lower(?1)) > 0
                 ORDER BY u.username"
            );
            query_user_list(conn, &sql, [term])
        }
        None => {
            let sql = format!("SELECT {USER_COLUMNS} FROM users u ORDER BY u.username");
            query_user_list(conn, &sql, [])
        }
    }
}

fn query_user_list<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<UserRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, user_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_authored<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<AuthoredMessageRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, authored_message_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn edge_exists(conn: &Connection, follower_id: &str, followed_id: &str) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM follows
                       WHERE user_following_id = ?1 AND user_being_followed_id = ?2)",
        [follower_id, followed_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn count<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<u64> {
    let n: i64 = conn.query_row(sql, params, |row| row.get(0))?;
    Ok(n.max(0) as u64)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        image_url: row.get(3)?,
        header_image_url: row.get(4)?,
        bio: row.get(5)?,
        location: row.get(6)?,
        password: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        text: row.get(1)?,
        timestamp: row.get(2)?,
        user_id: row.get(3)?,
    })
}

fn authored_message_from_row(row: &Row<'_>) -> rusqlite::Result<AuthoredMessageRow> {
    Ok(AuthoredMessageRow {
        id: row.get(0)?,
        text: row.get(1)?,
        timestamp: row.get(2)?,
        user_id: row.get(3)?,
        author_username: row.get(4)?,
        author_image_url: row.get(5)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warbler_types::models::{Like, User};

    fn setup() -> (Database, UserRow, UserRow) {
        let db = Database::open_in_memory().unwrap();
        let user = db
            .insert_user(&NewUser::new("testuser", "test@test.com", "HASHED_PASSWORD"))
            .unwrap();
        let cow = db
            .insert_user(&NewUser::new("cowabunga", "cow@pep.corn", "peppercorn"))
            .unwrap();
        (db, user, cow)
    }

    fn ids(rows: &[UserRow]) -> Vec<&str> {
        rows.iter().map(|r| r.id.as_str()).collect()
    }

    // -- Users --

    #[test]
    fn new_user_has_no_messages_or_followers() {
        let (db, user, _) = setup();

        let found = db.get_user_by_username("testuser").unwrap().unwrap();
        assert_eq!(found, user);
        assert!(db.messages_for_user(&found.id, 100).unwrap().is_empty());
        assert!(db.followers(&found.id).unwrap().is_empty());

        let all = db.list_users(None).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.contains(&found));
    }

    #[test]
    fn new_user_gets_default_images() {
        let (_, user, _) = setup();
        assert_eq!(user.image_url, DEFAULT_IMAGE_URL);
        assert_eq!(user.header_image_url, DEFAULT_HEADER_IMAGE_URL);
        assert!(user.bio.is_none());
    }

    #[test]
    fn user_row_maps_to_display_form() {
        let (db, _, cow) = setup();
        let row = db.get_user_by_id(&cow.id).unwrap().unwrap();
        let user = User::try_from(row).unwrap();
        assert_eq!(user.to_string(), format!("<User #{}: cowabunga, cow@pep.corn>", cow.id));
    }

    #[test]
    fn user_without_required_fields_is_rejected() {
        let (db, _, _) = setup();

        let missing_username = NewUser {
            email: Some("nobody@test.com".into()),
            password: Some("HASHED".into()),
            ..Default::default()
        };
        let err = db.insert_user(&missing_username).unwrap_err();
        assert!(err.is_integrity(), "{err}");

        let missing_password = NewUser {
            email: Some("nobody@test.com".into()),
            username: Some("nobody".into()),
            ..Default::default()
        };
        assert!(db.insert_user(&missing_password).unwrap_err().is_integrity());

        assert_eq!(db.count_users().unwrap(), 2);
    }

    #[test]
    fn duplicate_username_is_an_integrity_failure() {
        let (db, _, _) = setup();
        let err = db
            .insert_user(&NewUser::new("testuser", "other@test.com", "pw"))
            .unwrap_err();
        assert!(matches!(err, DbError::Integrity(_)));
        assert_eq!(db.count_users().unwrap(), 2);
    }

    #[test]
    fn duplicate_email_is_an_integrity_failure() {
        let (db, _, _) = setup();
        let err = db
            .insert_user(&NewUser::new("someone", "cow@pep.corn", "pw"))
            .unwrap_err();
        assert!(err.is_integrity());
    }

    #[test]
    fn search_matches_username_substring() {
        let (db, _, cow) = setup();
        let found = db.list_users(Some("BUNG")).unwrap();
        assert_eq!(ids(&found), vec![cow.id.as_str()]);
        assert!(db.list_users(Some("zzz")).unwrap().is_empty());
    }

    #[test]
    fn update_user_replaces_profile_fields() {
        let (db, user, _) = setup();
        let updated = db
            .update_user(
                &user.id,
                &UserUpdate {
                    username: "renamed".into(),
                    email: "renamed@test.com".into(),
                    image_url: Some("me.png".into()),
                    header_image_url: None,
                    bio: Some("hello".into()),
                    location: Some("here".into()),
                },
            )
            .unwrap();

        assert_eq!(updated.username, "renamed");
        assert_eq!(updated.image_url, "me.png");
        assert_eq!(updated.header_image_url, DEFAULT_HEADER_IMAGE_URL);
        assert_eq!(updated.bio.as_deref(), Some("hello"));
        assert_eq!(updated.password, user.password);
    }

    #[test]
    fn update_user_into_taken_username_fails() {
        let (db, user, _) = setup();
        let err = db
            .update_user(
                &user.id,
                &UserUpdate {
                    username: "cowabunga".into(),
                    email: user.email.clone(),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_integrity());
    }

    #[test]
    fn update_missing_user_is_not_found() {
        let (db, _, _) = setup();
        let err = db
            .update_user(&Uuid::new_v4().to_string(), &UserUpdate::default())
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { entity: "user", .. }));
    }

    // -- Messages --

    #[test]
    fn add_message() {
        let (db, user, _) = setup();
        let msg = db
            .insert_message(&NewMessage::new(&user.id, "Dasterly depths round the arrow."))
            .unwrap();

        assert_eq!(db.count_messages().unwrap(), 1);
        assert_eq!(msg.user_id, user.id);
        assert_eq!(db.messages_for_user(&user.id, 100).unwrap(), vec![msg]);
    }

    #[test]
    fn message_owner_is_its_user() {
        let (db, user, _) = setup();
        let msg = db
            .insert_message(&NewMessage::new(&user.id, "Dasterly depths round the arrow."))
            .unwrap();

        let owner = db.message_owner(&msg.id).unwrap().unwrap();
        assert_eq!(owner.id, user.id);
    }

    #[test]
    fn message_without_user_is_not_persisted() {
        let (db, _, _) = setup();
        let err = db
            .insert_message(&NewMessage {
                text: Some("Nothing fails further calling. Computer job seeking".into()),
                user_id: None,
            })
            .unwrap_err();

        assert!(err.is_integrity());
        assert_eq!(db.count_messages().unwrap(), 0);
    }

    #[test]
    fn message_without_text_is_not_persisted() {
        let (db, _, cow) = setup();
        let err = db
            .insert_message(&NewMessage {
                text: None,
                user_id: Some(cow.id.clone()),
            })
            .unwrap_err();

        assert!(err.is_integrity());
        assert_eq!(db.count_messages().unwrap(), 0);
    }

    #[test]
    fn message_with_unknown_owner_is_not_persisted() {
        let (db, _, _) = setup();
        let err = db
            .insert_message(&NewMessage::new(&Uuid::new_v4().to_string(), "orphan"))
            .unwrap_err();

        assert!(err.is_integrity());
        assert_eq!(db.count_messages().unwrap(), 0);
    }

    #[test]
    fn message_longer_than_limit_is_rejected() {
        let (db, user, _) = setup();
        let text = "x".repeat(141);
        assert!(db.insert_message(&NewMessage::new(&user.id, &text)).unwrap_err().is_integrity());

        let text = "x".repeat(140);
        assert!(db.insert_message(&NewMessage::new(&user.id, &text)).is_ok());
    }

    #[test]
    fn failed_write_rolls_back_whole_transaction() {
        let (db, _, _) = setup();

        let result = db.transaction(|tx| {
            let user = insert_user(tx, &NewUser::new("ghost", "ghost@test.com", "pw"))?;
            insert_message(tx, &NewMessage::new(&user.id, "first"))?;
            insert_message(
                tx,
                &NewMessage {
                    text: None,
                    user_id: Some(user.id),
                },
            )
        });

        assert!(result.unwrap_err().is_integrity());
        assert!(db.get_user_by_username("ghost").unwrap().is_none());
        assert_eq!(db.count_users().unwrap(), 2);
        assert_eq!(db.count_messages().unwrap(), 0);
    }

    #[test]
    fn delete_message_reports_whether_it_existed() {
        let (db, user, _) = setup();
        let msg = db.insert_message(&NewMessage::new(&user.id, "bye")).unwrap();

        assert!(db.delete_message(&msg.id).unwrap());
        assert!(!db.delete_message(&msg.id).unwrap());
        assert!(db.get_message(&msg.id).unwrap().is_none());
    }

    // -- Follows --

    #[test]
    fn follows_are_directed() {
        let (db, user, cow) = setup();
        db.follow(&user.id, &cow.id).unwrap();

        assert_eq!(ids(&db.following(&user.id).unwrap()), vec![cow.id.as_str()]);
        assert!(db.following(&cow.id).unwrap().is_empty());
        assert_eq!(ids(&db.followers(&cow.id).unwrap()), vec![user.id.as_str()]);
        assert!(db.followers(&user.id).unwrap().is_empty());

        assert!(db.is_following(&user.id, &cow.id).unwrap());
        assert!(!db.is_following(&cow.id, &user.id).unwrap());
        assert!(!db.is_followed_by(&user.id, &cow.id).unwrap());
        assert!(db.is_followed_by(&cow.id, &user.id).unwrap());

        assert_eq!(db.count_followers(&cow.id).unwrap(), 1);
        assert_eq!(db.count_following(&cow.id).unwrap(), 0);
    }

    #[test]
    fn duplicate_follow_is_an_integrity_failure() {
        let (db, user, cow) = setup();
        db.follow(&user.id, &cow.id).unwrap();
        assert!(db.follow(&user.id, &cow.id).unwrap_err().is_integrity());
        assert_eq!(db.count_follows().unwrap(), 1);
    }

    #[test]
    fn model_allows_self_follow() {
        let (db, user, _) = setup();
        db.follow(&user.id, &user.id).unwrap();
        assert!(db.is_following(&user.id, &user.id).unwrap());
        assert!(db.is_followed_by(&user.id, &user.id).unwrap());
        assert_eq!(db.count_followers(&user.id).unwrap(), 1);
    }

    #[test]
    fn follow_of_unknown_user_is_rejected() {
        let (db, user, _) = setup();
        let err = db.follow(&user.id, &Uuid::new_v4().to_string()).unwrap_err();
        assert!(err.is_integrity());
    }

    #[test]
    fn unfollow_removes_only_that_edge() {
        let (db, user, cow) = setup();
        db.follow(&user.id, &cow.id).unwrap();
        db.follow(&cow.id, &user.id).unwrap();

        assert!(db.unfollow(&user.id, &cow.id).unwrap());
        assert!(!db.unfollow(&user.id, &cow.id).unwrap());
        assert!(!db.is_following(&user.id, &cow.id).unwrap());
        assert!(db.is_following(&cow.id, &user.id).unwrap());
    }

    #[test]
    fn timeline_covers_self_and_followed_users() {
        let (db, user, cow) = setup();
        let stranger = db
            .insert_user(&NewUser::new("stranger", "stranger@test.com", "pw"))
            .unwrap();

        db.follow(&user.id, &cow.id).unwrap();
        db.insert_message(&NewMessage::new(&user.id, "mine")).unwrap();
        db.insert_message(&NewMessage::new(&cow.id, "moo")).unwrap();
        db.insert_message(&NewMessage::new(&stranger.id, "who?")).unwrap();

        let timeline = db.timeline(&user.id, 100).unwrap();
        let texts: Vec<&str> = timeline.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["moo", "mine"]);
        assert_eq!(timeline[0].author_username, "cowabunga");

        assert_eq!(db.timeline(&user.id, 1).unwrap().len(), 1);
    }

    // -- Likes --

    #[test]
    fn toggle_like_adds_then_removes() {
        let (db, user, cow) = setup();
        let msg = db.insert_message(&NewMessage::new(&cow.id, "moo")).unwrap();

        assert!(db.toggle_like(&user.id, &msg.id).unwrap());
        assert_eq!(db.likes_for_user(&user.id).unwrap().len(), 1);
        let liked = db.liked_messages(&user.id).unwrap();
        assert_eq!(liked.len(), 1);
        assert_eq!(liked[0].id, msg.id);
        let like = Like::try_from(db.likes_for_user(&user.id).unwrap().remove(0)).unwrap();
        assert_eq!(like.message_id.to_string(), msg.id);
        assert_eq!(like.user_id.to_string(), user.id);

        assert!(!db.toggle_like(&user.id, &msg.id).unwrap());
        assert!(db.likes_for_user(&user.id).unwrap().is_empty());
    }

    #[test]
    fn like_of_unknown_message_is_rejected() {
        let (db, user, _) = setup();
        let err = db.toggle_like(&user.id, &Uuid::new_v4().to_string()).unwrap_err();
        assert!(err.is_integrity());
        assert!(db.likes_for_user(&user.id).unwrap().is_empty());
    }

    #[test]
    fn deleting_user_cascades_to_messages_follows_and_likes() {
        let (db, user, cow) = setup();
        let msg = db.insert_message(&NewMessage::new(&cow.id, "moo")).unwrap();
        db.insert_message(&NewMessage::new(&user.id, "mine")).unwrap();
        db.follow(&user.id, &cow.id).unwrap();
        db.follow(&cow.id, &user.id).unwrap();
        db.toggle_like(&user.id, &msg.id).unwrap();

        assert!(db.delete_user(&cow.id).unwrap());

        assert_eq!(db.count_users().unwrap(), 1);
        assert_eq!(db.count_messages().unwrap(), 1);
        assert_eq!(db.count_follows().unwrap(), 0);
        assert!(db.likes_for_user(&user.id).unwrap().is_empty());
    }
}
