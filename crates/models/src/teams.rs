//! Teams and their members.

use std::collections::HashMap;

use rusqlite::{Connection, Row};
use tasklane_api::db::teams as q;
use tasklane_api::service::{self, Pagination};
use tasklane_api::{Right, Team, TeamMember, TeamUser};

use crate::{Auth, Error, Page, Permissions, Result, auth, sq, users};

pub(crate) fn team_from_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_by_id: row.get(3)?,
        created_by: None,
        members: Vec::new(),
        created: row.get(4)?,
        updated: row.get(5)?,
    })
}

/// Attach creators and members to each team.
pub(crate) fn add_details(conn: &Connection, teams: &mut [Team]) -> Result<()> {
    if teams.is_empty() {
        return Ok(());
    }
    let creator_ids: Vec<i64> = teams.iter().map(|t| t.created_by_id).collect();
    let creators = users::get_many(conn, &creator_ids)?;

    let team_ids: Vec<i64> = teams.iter().map(|t| t.id).collect();
    let rows = sq::query_map(conn, q::member_list(&team_ids), |row| {
        Ok((
            row.get::<_, i64>(0)?,
            TeamUser {
                user: users::user_at(row, 1)?,
                admin: row.get(6)?,
            },
        ))
    })?;
    let mut members: HashMap<i64, Vec<TeamUser>> = HashMap::new();
    for (team_id, member) in rows {
        members.entry(team_id).or_default().push(member);
    }

    for team in teams.iter_mut() {
        team.created_by = creators.get(&team.created_by_id).cloned();
        team.members = members.remove(&team.id).unwrap_or_default();
    }
    Ok(())
}

pub fn get_simple(conn: &Connection, id: i64) -> Result<Team> {
    sq::query_opt(conn, q::get_by_id(id), team_from_row)?.ok_or(Error::TeamDoesNotExist { id })
}

pub fn read_one(conn: &Connection, id: i64) -> Result<Team> {
    let mut team = get_simple(conn, id)?;
    add_details(conn, std::slice::from_mut(&mut team))?;
    Ok(team)
}

/// `Some(admin)` when the principal is a member of the team.
fn membership(conn: &Connection, auth: &Auth, team_id: i64) -> Result<Option<bool>> {
    let Some(user_id) = auth.user_id() else {
        return Ok(None);
    };
    Ok(sq::query_opt(conn, q::member_get(team_id, user_id), |row| row.get(2))?)
}

pub fn is_admin(conn: &Connection, auth: &Auth, team_id: i64) -> Result<bool> {
    get_simple(conn, team_id)?;
    Ok(membership(conn, auth, team_id)? == Some(true))
}

impl Permissions for Team {
    fn can_create(&self, _conn: &Connection, auth: &Auth) -> Result<bool> {
        Ok(!auth.is_link_share())
    }

    fn can_read(&self, conn: &Connection, auth: &Auth) -> Result<Option<Right>> {
        get_simple(conn, self.id)?;
        Ok(membership(conn, auth, self.id)?.map(|admin| if admin { Right::Admin } else { Right::Read }))
    }

    fn can_update(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
        is_admin(conn, auth, self.id)
    }

    fn can_delete(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
        is_admin(conn, auth, self.id)
    }
}

fn validate(team: &Team) -> Result<()> {
    if team.name.trim().is_empty() {
        return Err(Error::TeamNameCannotBeEmpty);
    }
    service::validate_title("name", &team.name)?;
    Ok(())
}

/// Create a team; the creator joins it as admin.
pub fn create(conn: &Connection, auth: &Auth, team: &Team) -> Result<Team> {
    validate(team)?;
    let doer = auth::user_from_auth(conn, auth)?;
    let tx = conn.unchecked_transaction()?;
    let id = sq::insert(&tx, q::insert(&team.name, &team.description, doer.id))?;
    sq::insert(&tx, q::member_insert(id, doer.id, true))?;
    tx.commit()?;
    tracing::debug!(team_id = id, "created team");
    read_one(conn, id)
}

/// Teams the user belongs to, with members.
pub fn read_all(conn: &Connection, auth: &Auth, search: &str, pagination: Pagination) -> Result<Page<Team>> {
    let doer = auth::user_from_auth(conn, auth)?;
    let mut teams = sq::query_map(conn, q::for_user(doer.id, search), team_from_row)?;
    add_details(conn, &mut teams)?;
    Ok(Page::slice(teams, pagination))
}

pub fn update(conn: &Connection, team: &Team) -> Result<Team> {
    validate(team)?;
    get_simple(conn, team.id)?;
    sq::execute(conn, q::update(team.id, &team.name, &team.description))?;
    read_one(conn, team.id)
}

/// Delete a team. Memberships and the team's shares go with it.
pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    get_simple(conn, id)?;
    sq::execute(conn, q::delete(id))?;
    tracing::debug!(team_id = id, "deleted team");
    Ok(())
}

pub fn count(conn: &Connection) -> Result<i64> {
    Ok(sq::count(conn, q::count())?)
}

// ── Members ───────────────────────────────────────────────────────────────

impl Permissions for TeamMember {
    fn can_create(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
        is_admin(conn, auth, self.team_id)
    }

    fn can_update(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
        is_admin(conn, auth, self.team_id)
    }

    fn can_delete(&self, conn: &Connection, auth: &Auth) -> Result<bool> {
        is_admin(conn, auth, self.team_id)
    }
}

fn stored_member(conn: &Connection, team_id: i64, username: &str) -> Result<TeamMember> {
    let user = users::get_by_username(conn, username)?;
    let (id, created, admin) = sq::query_opt(conn, q::member_get(team_id, user.id), |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, bool>(2)?))
    })?
    .ok_or(Error::UserDoesNotExist)?;
    Ok(TeamMember {
        id,
        team_id,
        username: user.username,
        admin,
        created,
    })
}

/// Add a user, looked up by username, to a team.
pub fn member_create(conn: &Connection, member: &TeamMember) -> Result<TeamMember> {
    get_simple(conn, member.team_id)?;
    let user = users::get_by_username(conn, &member.username)?;
    if sq::query_opt(conn, q::member_get(member.team_id, user.id), |row| row.get::<_, i64>(0))?.is_some() {
        return Err(Error::UserIsMemberOfTeam);
    }
    sq::insert(conn, q::member_insert(member.team_id, user.id, member.admin))?;
    stored_member(conn, member.team_id, &user.username)
}

/// Remove a member. A team never drops to zero members.
pub fn member_delete(conn: &Connection, team_id: i64, username: &str) -> Result<()> {
    get_simple(conn, team_id)?;
    if sq::count(conn, q::member_count(team_id))? <= 1 {
        return Err(Error::CannotDeleteLastTeamMember);
    }
    let user = users::get_by_username(conn, username)?;
    sq::execute(conn, q::member_delete(team_id, user.id))?;
    Ok(())
}

/// Flip a member's admin flag and return the membership as stored now.
pub fn member_toggle_admin(conn: &Connection, team_id: i64, username: &str) -> Result<TeamMember> {
    get_simple(conn, team_id)?;
    let current = stored_member(conn, team_id, username)?;
    let user = users::get_by_username(conn, username)?;
    sq::execute(conn, q::member_set_admin(team_id, user.id, !current.admin))?;
    stored_member(conn, team_id, username)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn named(name: &str) -> Team {
        Team {
            name: name.into(),
            ..Default::default()
        }
    }

    fn member(team_id: i64, username: &str) -> TeamMember {
        TeamMember {
            team_id,
            username: username.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create() {
        let conn = testing::fixtures();
        let team = create(&conn, &testing::user1(), &named("Lorem")).unwrap();
        assert_eq!(team.created_by.as_ref().unwrap().id, 1);
        assert_eq!(team.members.len(), 1);
        assert!(team.members[0].admin);

        assert!(matches!(
            create(&conn, &testing::user1(), &named("")).unwrap_err(),
            Error::TeamNameCannotBeEmpty
        ));
        assert!(!named("x").can_create(&conn, &testing::link_share(1)).unwrap());
    }

    #[test]
    fn test_read() {
        let conn = testing::fixtures();
        let team = read_one(&conn, 1).unwrap();
        assert_eq!(team.name, "testteam1");
        assert_eq!(
            team.members.iter().map(|m| (m.user.id, m.admin)).collect::<Vec<_>>(),
            vec![(1, true), (2, false)]
        );
        assert!(matches!(read_one(&conn, 9999).unwrap_err(), Error::TeamDoesNotExist { id: 9999 }));

        let page = read_all(&conn, &testing::user1(), "", Pagination::all()).unwrap();
        assert_eq!(page.items.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3]);
        let page = read_all(&conn, &testing::user1(), "team3", Pagination::all()).unwrap();
        assert_eq!(page.total, 1);
        assert!(matches!(
            read_all(&conn, &testing::link_share(1), "", Pagination::all()).unwrap_err(),
            Error::GenericForbidden
        ));
    }

    #[test]
    fn test_update_and_delete() {
        let conn = testing::fixtures();
        let renamed = Team {
            id: 1,
            ..named("renamed")
        };
        assert_eq!(update(&conn, &renamed).unwrap().name, "renamed");
        let unnamed = Team {
            id: 1,
            ..Default::default()
        };
        assert!(matches!(update(&conn, &unnamed).unwrap_err(), Error::TeamNameCannotBeEmpty));

        delete(&conn, 1).unwrap();
        assert!(matches!(get_simple(&conn, 1).unwrap_err(), Error::TeamDoesNotExist { .. }));
        // the team share on list 4 is gone
        let list = tasklane_api::List {
            id: 4,
            ..Default::default()
        };
        assert_eq!(list.can_read(&conn, &testing::user1()).unwrap(), None);
    }

    #[test]
    fn test_rights() {
        let conn = testing::fixtures();
        let team = |id| Team {
            id,
            ..Default::default()
        };
        assert_eq!(team(1).can_read(&conn, &testing::user1()).unwrap(), Some(Right::Admin));
        assert_eq!(team(1).can_read(&conn, &testing::user2()).unwrap(), Some(Right::Read));
        assert_eq!(team(1).can_read(&conn, &testing::user3()).unwrap(), None);
        assert!(team(1).can_update(&conn, &testing::user1()).unwrap());
        assert!(!team(1).can_delete(&conn, &testing::user2()).unwrap());
        assert!(member(1, "user3").can_create(&conn, &testing::user1()).unwrap());
        assert!(!member(2, "user1").can_create(&conn, &testing::user1()).unwrap());
    }

    #[test]
    fn test_members() {
        let conn = testing::fixtures();
        let added = member_create(&conn, &member(1, "user3")).unwrap();
        assert_eq!(added.username, "user3");
        assert!(!added.admin);

        assert!(matches!(
            member_create(&conn, &member(1, "user3")).unwrap_err(),
            Error::UserIsMemberOfTeam
        ));
        assert!(matches!(
            member_create(&conn, &member(1, "nobody")).unwrap_err(),
            Error::UserDoesNotExist
        ));
        assert!(matches!(
            member_create(&conn, &member(9999, "user3")).unwrap_err(),
            Error::TeamDoesNotExist { id: 9999 }
        ));

        assert!(member_toggle_admin(&conn, 1, "user3").unwrap().admin);
        assert!(!member_toggle_admin(&conn, 1, "user3").unwrap().admin);

        member_delete(&conn, 1, "user3").unwrap();
        assert_eq!(read_one(&conn, 1).unwrap().members.len(), 2);
        assert!(matches!(
            member_delete(&conn, 2, "user3").unwrap_err(),
            Error::CannotDeleteLastTeamMember
        ));
    }
}
