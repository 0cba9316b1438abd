//! Renders a [`SearchPlan`] into SQL.
//!
//! Text relevance counts case-insensitive occurrences of each term, weighted
//! title 3, director 2, description 1, so results order the same way as the
//! in-memory store.

use domains::search::{Predicate, SearchPlan, SortKey, SortOrder};
use sqlx::{Postgres, QueryBuilder};

pub(crate) const MOVIE_COLUMNS: &str = "id, title, description, genres, language, director, \
                                        release_date, duration_minutes, status, rating_avg, \
                                        rating_count, views, poster_url, video_url, uploader_id, \
                                        created_at, updated_at";

/// `SELECT <select> FROM movies [, <join>] WHERE ...` for the plan's predicates.
pub(crate) fn filtered<'a>(select: &str, join: Option<&str>, plan: &SearchPlan) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {select} FROM movies"));
    if let Some(join) = join {
        qb.push(", ").push(join);
    }
    for (i, predicate) in plan.predicates().iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        push_predicate(&mut qb, predicate);
    }
    qb
}

fn push_predicate(qb: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::GenreIs(genre) => {
            qb.push("EXISTS (SELECT 1 FROM unnest(movies.genres) mg WHERE lower(mg) = lower(")
                .push_bind(genre.clone())
                .push("))");
        }
        Predicate::LanguageIs(language) => {
            qb.push("lower(language) = lower(").push_bind(language.clone()).push(")");
        }
        Predicate::RatingAtLeast(min) => {
            qb.push("rating_avg >= ").push_bind(*min);
        }
        Predicate::StatusIs(status) => {
            qb.push("status = ").push_bind(status.as_str());
        }
        Predicate::ReleasedOnOrAfter(date) => {
            qb.push("release_date >= ").push_bind(*date);
        }
        Predicate::ReleasedOnOrBefore(date) => {
            qb.push("release_date <= ").push_bind(*date);
        }
        Predicate::DirectorContains(fragment) => {
            qb.push("strpos(lower(director), lower(")
                .push_bind(fragment.clone())
                .push(")) > 0");
        }
        Predicate::ReleasedInYear(year) => {
            qb.push("EXTRACT(YEAR FROM release_date)::int = ").push_bind(*year);
        }
        Predicate::TextMatches(terms) => {
            qb.push("(");
            for (i, term) in terms.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                for (j, column) in ["title", "director", "description"].iter().enumerate() {
                    if j > 0 {
                        qb.push(" OR ");
                    }
                    qb.push(format_args!("strpos(lower({column}), "))
                        .push_bind(term.clone())
                        .push(") > 0");
                }
            }
            qb.push(")");
        }
    }
}

/// Occurrences of `term` in `column`, computed from the length difference.
fn push_occurrences(qb: &mut QueryBuilder<'_, Postgres>, column: &str, term: &str) {
    qb.push(format_args!("((length(lower({column})) - length(replace(lower({column}), "))
        .push_bind(term.to_string())
        .push(", ''))) / ")
        .push_bind(term.chars().count() as i32)
        .push(")");
}

fn push_relevance(qb: &mut QueryBuilder<'_, Postgres>, terms: &[String]) {
    qb.push("(0");
    for term in terms {
        for (column, weight) in [("title", 3), ("director", 2), ("description", 1)] {
            qb.push(format_args!(" + {weight} * "));
            push_occurrences(qb, column, term);
        }
    }
    qb.push(")");
}

/// `ORDER BY ... LIMIT ... OFFSET ...`, always ending on `id` for a stable order.
pub(crate) fn push_order_and_page(qb: &mut QueryBuilder<'_, Postgres>, plan: &SearchPlan) {
    qb.push(" ORDER BY ");
    for key in plan.sort() {
        match key {
            SortKey::Relevance => {
                if let Some(terms) = plan.text_terms() {
                    push_relevance(qb, terms);
                    qb.push(" DESC, ");
                }
            }
            SortKey::Field(field, order) => {
                let column = field.column();
                let nulls = match order {
                    SortOrder::Asc => "NULLS FIRST",
                    SortOrder::Desc => "NULLS LAST",
                };
                if column == "title" {
                    qb.push(format_args!("lower(title) {} {nulls}, ", order.keyword()));
                } else {
                    qb.push(format_args!("{column} {} {nulls}, ", order.keyword()));
                }
            }
        }
    }
    let page = plan.page();
    qb.push("id ASC LIMIT ")
        .push_bind(i64::from(page.limit()))
        .push(" OFFSET ")
        .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
}
