//! Cross-entity substring search.
//!
//! Matching uses SQLite `LIKE`, which folds ASCII case only. `%` and `_`
//! in the query are matched literally.

use rusqlite::{Connection, named_params};

use super::{collect, milestones, part_numbers, programs, users, work_items};
use crate::db::Result;
use crate::pm::SearchResults;

fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Searches every entity for `query`. A blank query matches nothing.
pub fn search(conn: &Connection, query: &str) -> Result<SearchResults> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(SearchResults::default());
    }
    let pattern = like_pattern(query);

    let work_items = work_items::query(
        conn,
        "WHERE w.title LIKE ?1 ESCAPE '\\'
            OR w.description LIKE ?1 ESCAPE '\\'
            OR w.tags LIKE ?1 ESCAPE '\\'",
        [&pattern],
    )?;

    let programs = {
        let mut stmt = conn.prepare(
            "SELECT id, name, description, program_manager_user_id, start_date, end_date
             FROM programs
             WHERE name LIKE ?1 ESCAPE '\\' OR description LIKE ?1 ESCAPE '\\'
             ORDER BY id",
        )?;
        collect(stmt.query_map([&pattern], programs::from_row)?)?
    };

    let users = {
        let mut stmt = conn.prepare(
            "SELECT id, username, name, email, phone_number, role, profile_picture_url,
                    discipline_team_id
             FROM users
             WHERE username LIKE ?1 ESCAPE '\\' OR name LIKE ?1 ESCAPE '\\'
                OR email LIKE ?1 ESCAPE '\\' OR phone_number LIKE ?1 ESCAPE '\\'
             ORDER BY id",
        )?;
        collect(stmt.query_map([&pattern], users::from_row)?)?
    };

    let milestones = {
        let mut stmt = conn.prepare(
            "SELECT id, name, description, date, program_id
             FROM milestones
             WHERE name LIKE ?1 ESCAPE '\\' OR description LIKE ?1 ESCAPE '\\'
             ORDER BY date, id",
        )?;
        collect(stmt.query_map([&pattern], milestones::from_row)?)?
    };

    let part_numbers = {
        let mut stmt = conn.prepare(
            "SELECT id, number, part_name, level, state, revision_level, assigned_user_id,
                    program_id, parent_id
             FROM part_numbers
             WHERE part_name LIKE :pattern ESCAPE '\\'
                OR (:number IS NOT NULL AND number = :number)
             ORDER BY number, id",
        )?;
        let number = query.parse::<i64>().ok();
        collect(stmt.query_map(
            named_params! { ":pattern": pattern, ":number": number },
            part_numbers::from_row,
        )?)?
    };

    let results = SearchResults {
        work_items,
        programs,
        users,
        milestones,
        part_numbers,
    };
    tracing::debug!(
        query,
        work_items = results.work_items.len(),
        programs = results.programs.len(),
        users = results.users.len(),
        milestones = results.milestones.len(),
        part_numbers = results.part_numbers.len(),
        "search"
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repo::fixtures;
    use crate::pm::{NewMilestone, WorkItemType};
    use pretty_assertions::assert_eq;

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(like_pattern("50%_done"), "%50\\%\\_done%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn blank_query_matches_nothing() {
        let mut conn = fixtures::db();
        fixtures::program(&mut conn, "Rover");
        let results = search(&conn, "   ").unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn matches_across_entities_case_insensitively() {
        let mut conn = fixtures::db();
        let ada = fixtures::user(&mut conn, "ada");
        let rover = fixtures::program(&mut conn, "Rover Chassis");
        fixtures::program(&mut conn, "Lander");
        milestones::create(
            &mut conn,
            &NewMilestone {
                name: "Chassis CDR".to_string(),
                description: None,
                date: fixtures::day(14),
                program_id: rover,
            },
        )
        .unwrap();
        let mut item = fixtures::new_item(WorkItemType::Task, rover, ada);
        item.title = "Weld chassis rails".to_string();
        work_items::create(&mut conn, &item).unwrap();
        let mut part = fixtures::new_part(rover, 42, None);
        part.part_name = "Chassis frame".to_string();
        part_numbers::create(&mut conn, &part).unwrap();

        let results = search(&conn, "CHASSIS").unwrap();
        assert_eq!(results.programs.len(), 1);
        assert_eq!(results.milestones.len(), 1);
        assert_eq!(results.work_items.len(), 1);
        assert_eq!(results.part_numbers.len(), 1);
        assert!(results.users.is_empty());

        let by_user = search(&conn, "ada@example").unwrap();
        assert_eq!(by_user.users.len(), 1);
    }

    #[test]
    fn numeric_query_matches_part_number_exactly() {
        let mut conn = fixtures::db();
        let program = fixtures::program(&mut conn, "Rover");
        fixtures::part(&mut conn, program, 42, None);
        fixtures::part(&mut conn, program, 420, None);

        let results = search(&conn, "42").unwrap();
        let numbers: Vec<i64> = results.part_numbers.iter().map(|p| p.number).collect();
        // "Part 420" also contains "42" in its name.
        assert_eq!(numbers, vec![42, 420]);

        let exact = search(&conn, "420").unwrap();
        assert_eq!(exact.part_numbers.len(), 1);
    }

    #[test]
    fn literal_percent_does_not_match_everything() {
        let mut conn = fixtures::db();
        fixtures::program(&mut conn, "Rover");
        let results = search(&conn, "%").unwrap();
        assert!(results.is_empty());
    }
}
