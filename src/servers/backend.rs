use diesel::dsl::count_distinct;
use diesel::pg::Pg;
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    Error,
    models::{Backend, Category, Server, ServerSummary, Users},
    schema,
};

use super::query::{self, ServerListQuery};

/// Composes the SQL stages of the listing pipeline onto one boxed query:
/// category filter, membership filter, result cap. Each stage narrows the
/// previous one; none of them mutates shared state.
pub(crate) fn server_list_query<'a>(
    query: &'a ServerListQuery,
    viewer: Option<Uuid>,
) -> Result<schema::servers::BoxedQuery<'a, Pg>, Error> {
    use crate::schema::{categories, server_members, servers};

    let mut sql = servers::table.order(servers::created_at.asc()).into_boxed();
    if let Some(category) = query.category.as_deref() {
        sql = sql.filter(
            servers::category_id.eq_any(
                categories::table
                    .filter(categories::name.eq(category))
                    .select(categories::id),
            ),
        );
    }
    if query.by_user {
        let viewer = viewer.ok_or(Error::AuthenticationRequired)?;
        sql = sql.filter(
            servers::id.eq_any(
                server_members::table
                    .filter(server_members::user_id.eq(viewer))
                    .select(server_members::server_id),
            ),
        );
    }
    if let Some(qty) = query.qty()? {
        sql = sql.limit(qty);
    }
    Ok(sql)
}

impl Backend {
    /// Runs the listing pipeline: authentication gate, SQL stages, member
    /// count annotation, id selection. The id stage operates on the rows the
    /// earlier stages left over, so a server narrowed away by category or
    /// membership is reported as not found even if it exists globally.
    pub fn list_servers(
        &self,
        query: &ServerListQuery,
        user: Option<&Users>,
    ) -> Result<Vec<ServerSummary>, Error> {
        if query.requires_authentication() && user.is_none() {
            return Err(Error::AuthenticationRequired);
        }

        let sql = server_list_query(query, user.map(|u| u.id))?;
        let mut conn = self.get_connection()?;
        let servers = sql.load::<Server>(&mut conn)?;
        drop(conn);

        let mut servers: Vec<ServerSummary> = servers.into_iter().map(Into::into).collect();
        if query.with_num_members {
            let ids: Vec<Uuid> = servers.iter().map(|s| s.id).collect();
            let counts = self.member_counts(&ids)?;
            query::attach_member_counts(&mut servers, &counts);
        }
        if let Some(id) = query.server_id()? {
            servers = query::select_by_server_id(servers, id)?;
        }
        Ok(servers)
    }

    fn member_counts(&self, server_ids: &[Uuid]) -> Result<Vec<(Uuid, i64)>, Error> {
        if server_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.get_connection()?;
        let counts = schema::server_members::table
            .filter(schema::server_members::server_id.eq_any(server_ids))
            .group_by(schema::server_members::server_id)
            .select((
                schema::server_members::server_id,
                count_distinct(schema::server_members::user_id),
            ))
            .load::<(Uuid, i64)>(&mut conn)?;
        Ok(counts)
    }

    pub fn create_server(
        &self,
        server_name: &str,
        category: &str,
        description: Option<String>,
        icon_path: Option<String>,
        owner_id: Uuid,
    ) -> Result<Server, Error> {
        let category_id = self.get_or_create_category(category)?;
        let mut conn = self.get_connection()?;
        let server = diesel::insert_into(schema::servers::table)
            .values((
                schema::servers::name.eq(server_name),
                schema::servers::owner_id.eq(owner_id),
                schema::servers::category_id.eq(category_id),
                schema::servers::description.eq(description),
                schema::servers::icon_path.eq(icon_path),
            ))
            .get_result::<Server>(&mut conn)?;
        drop(conn);

        self.join_user_to_server(owner_id, server.id)?;
        Ok(server)
    }

    pub fn get_server(&self, server_id: Uuid) -> Result<Option<Server>, Error> {
        let mut conn = self.get_connection()?;
        let server = schema::servers::table
            .filter(schema::servers::id.eq(server_id))
            .first::<Server>(&mut conn)
            .optional()?;
        Ok(server)
    }

    /// Joining twice is a no-op, the membership relation is unique per
    /// (user, server) pair.
    pub fn join_user_to_server(&self, user_id: Uuid, server_id: Uuid) -> Result<(), Error> {
        let mut conn = self.get_connection()?;
        diesel::insert_into(schema::server_members::table)
            .values((
                schema::server_members::user_id.eq(user_id),
                schema::server_members::server_id.eq(server_id),
            ))
            .on_conflict((
                schema::server_members::user_id,
                schema::server_members::server_id,
            ))
            .do_nothing()
            .execute(&mut conn)?;
        Ok(())
    }

    pub fn list_categories(&self) -> Result<Vec<Category>, Error> {
        let mut conn = self.get_connection()?;
        let categories = schema::categories::table
            .order(schema::categories::name.asc())
            .load::<Category>(&mut conn)?;
        Ok(categories)
    }

    fn get_or_create_category(&self, name: &str) -> Result<Uuid, Error> {
        let mut conn = self.get_connection()?;
        let existing = schema::categories::table
            .filter(schema::categories::name.eq(name))
            .select(schema::categories::id)
            .first::<Uuid>(&mut conn)
            .optional()?;
        if let Some(id) = existing {
            return Ok(id);
        }
        let id = diesel::insert_into(schema::categories::table)
            .values(schema::categories::name.eq(name))
            .returning(schema::categories::id)
            .get_result::<Uuid>(&mut conn)?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(query: &ServerListQuery, viewer: Option<Uuid>) -> String {
        let sql = server_list_query(query, viewer).unwrap();
        diesel::debug_query::<Pg, _>(&sql).to_string()
    }

    #[test]
    fn bare_listing_selects_everything_in_insertion_order() {
        let sql = rendered(&ServerListQuery::default(), None);
        assert!(sql.contains("ORDER BY"));
        assert!(sql.contains("created_at"));
        assert!(!sql.contains("WHERE"));
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn category_stage_filters_on_the_category_name() {
        let query = ServerListQuery {
            category: Some("gaming".to_string()),
            ..Default::default()
        };
        let sql = rendered(&query, None);
        assert!(sql.contains(r#""categories"."name""#));
        assert!(sql.contains(r#""servers"."category_id""#));
    }

    #[test]
    fn membership_stage_filters_on_the_viewer() {
        let query = ServerListQuery {
            by_user: true,
            ..Default::default()
        };
        let sql = rendered(&query, Some(Uuid::new_v4()));
        assert!(sql.contains(r#""server_members"."user_id""#));
    }

    #[test]
    fn membership_stage_without_a_viewer_is_rejected() {
        let query = ServerListQuery {
            by_user: true,
            ..Default::default()
        };
        assert!(matches!(
            server_list_query(&query, None),
            Err(Error::AuthenticationRequired)
        ));
    }

    #[test]
    fn qty_stage_caps_the_result() {
        let query = ServerListQuery {
            qty: Some("2".to_string()),
            ..Default::default()
        };
        let sql = rendered(&query, None);
        assert!(sql.contains("LIMIT"));
    }

    #[test]
    fn bad_qty_fails_query_composition() {
        let query = ServerListQuery {
            qty: Some("many".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            server_list_query(&query, None),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn stages_compose_on_one_query() {
        let query = ServerListQuery {
            category: Some("gaming".to_string()),
            qty: Some("2".to_string()),
            ..Default::default()
        };
        let sql = rendered(&query, None);
        assert!(sql.contains(r#""categories"."name""#));
        assert!(sql.contains("LIMIT"));
    }
}
