use application::{DEFAULT_PAGE_SIZE, QueryResult, SearchParams};
use domain::Person;
use std::cmp::Ordering;
use tracing::trace;

/// Runs a directory query over a snapshot of persons.
///
/// Text filter, then birthday range, then a sort on (first name, last name),
/// then pagination. Only the records on the returned page are cloned.
pub fn execute(persons: &[Person], params: &SearchParams) -> QueryResult {
    let query_lower = params.query.to_lowercase();
    let has_query = !params.query.is_empty();

    // --- Step 1: Text filter and birthday range ---
    let mut matches: Vec<&Person> = persons
        .iter()
        .filter(|person| !has_query || matches_text(person, &query_lower))
        .filter(|person| within_birthday_range(person, params))
        .collect();
    trace!(count = matches.len(), "Persons after filtering");

    // --- Step 2: Sort ---
    matches.sort_by(|a, b| compare_by_name(a, b));

    // --- Step 3: Paginate ---
    let total = matches.len();
    let (page, page_size) = normalize_paging(params.page, params.page_size);
    let (start, end) = page_bounds(page, page_size, total);
    let data: Vec<Person> = matches[start..end].iter().map(|&p| p.clone()).collect();

    trace!(total, start, end, returned = data.len(), "Page sliced");

    QueryResult {
        data,
        total,
        page,
        page_size,
    }
}

/// `query_lower` must already be lower-cased.
fn matches_text(person: &Person, query_lower: &str) -> bool {
    person.first_name().to_lowercase().contains(query_lower)
        || person.last_name().to_lowercase().contains(query_lower)
}

// Both bounds inclusive. An inverted range simply matches nothing.
fn within_birthday_range(person: &Person, params: &SearchParams) -> bool {
    let birthday = person.birthday();
    let after_from = params.birthday_from.is_none_or(|from| birthday >= from);
    let before_to = params.birthday_to.is_none_or(|to| birthday <= to);
    after_from && before_to
}

fn compare_by_name(a: &Person, b: &Person) -> Ordering {
    a.first_name()
        .cmp(b.first_name())
        .then_with(|| a.last_name().cmp(b.last_name()))
}

/// `page < 1` becomes 1 and a negative page size becomes the default.
/// A page size of exactly 0 is kept and yields an empty page.
fn normalize_paging(page: i64, page_size: i64) -> (i64, i64) {
    let page = if page < 1 { 1 } else { page };
    let page_size = if page_size < 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    };
    (page, page_size)
}

/// Half-open slice bounds for a normalized page, clamped to `[0, total]`.
fn page_bounds(page: i64, page_size: i64, total: usize) -> (usize, usize) {
    let total_i = i64::try_from(total).unwrap_or(i64::MAX);
    let start = (page - 1).saturating_mul(page_size).clamp(0, total_i);
    let end = start.saturating_add(page_size).clamp(0, total_i);
    // Both values lie in [0, total] so the conversions cannot fail.
    (
        usize::try_from(start).unwrap_or(total),
        usize::try_from(end).unwrap_or(total),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn person(first: &str, last: &str, birthday: &str) -> Person {
        Person::new(first, last, date(birthday)).unwrap()
    }

    fn sample_persons() -> Vec<Person> {
        vec![
            person("John", "Doe", "1990-05-15"),
            person("Jane", "Smith", "1985-08-22"),
            person("Peter", "Jones", "1992-11-30"),
            person("John", "Wick", "1964-09-02"),
        ]
    }

    // Sorted: Jane Smith, John Doe, John Wick, Martin McFly, Peter Jones, Sarah Connor
    fn extended_persons() -> Vec<Person> {
        let mut persons = sample_persons();
        persons.push(person("Sarah", "Connor", "1965-05-13"));
        persons.push(person("Martin", "McFly", "1968-06-12"));
        persons
    }

    fn params(page: i64, page_size: i64) -> SearchParams {
        SearchParams {
            page,
            page_size,
            ..Default::default()
        }
    }

    fn names(result: &QueryResult) -> Vec<String> {
        result.data.iter().map(Person::full_name).collect()
    }

    #[test]
    fn text_filter_matches_first_name_case_insensitively() {
        let result = execute(
            &sample_persons(),
            &SearchParams {
                query: "john".to_string(),
                ..params(1, 10)
            },
        );
        assert_eq!(names(&result), vec!["John Doe", "John Wick"]);
        assert_eq!(result.total, 2);
    }

    #[test]
    fn text_filter_matches_last_name() {
        let result = execute(
            &extended_persons(),
            &SearchParams {
                query: "CONNOR".to_string(),
                ..params(1, 10)
            },
        );
        assert_eq!(names(&result), vec!["Sarah Connor"]);
    }

    #[test]
    fn text_filter_is_not_trimmed() {
        let result = execute(
            &sample_persons(),
            &SearchParams {
                query: " john".to_string(),
                ..params(1, 10)
            },
        );
        assert_eq!(result.total, 0);
        assert!(result.data.is_empty());
    }

    #[test]
    fn empty_query_returns_full_sorted_page() {
        let result = execute(&sample_persons(), &params(1, 2));
        assert_eq!(names(&result), vec!["Jane Smith", "John Doe"]);
        assert_eq!(result.total, 4);
        assert_eq!(result.page, 1);
        assert_eq!(result.page_size, 2);
    }

    #[test]
    fn second_page_continues_sort_order() {
        let result = execute(&extended_persons(), &params(2, 3));
        assert_eq!(
            names(&result),
            vec!["Martin McFly", "Peter Jones", "Sarah Connor"]
        );
        assert_eq!(result.total, 6);
    }

    #[test]
    fn birthday_range_is_inclusive() {
        let result = execute(
            &sample_persons(),
            &SearchParams {
                birthday_from: Some(date("1980-01-01")),
                birthday_to: Some(date("1991-01-01")),
                ..params(1, 10)
            },
        );
        assert_eq!(names(&result), vec!["Jane Smith", "John Doe"]);
        assert_eq!(result.total, 2);

        let exact = execute(
            &sample_persons(),
            &SearchParams {
                birthday_from: Some(date("1990-05-15")),
                birthday_to: Some(date("1990-05-15")),
                ..params(1, 10)
            },
        );
        assert_eq!(names(&exact), vec!["John Doe"]);
    }

    #[test]
    fn birthday_range_with_single_bound() {
        let from_only = execute(
            &extended_persons(),
            &SearchParams {
                birthday_from: Some(date("1990-01-01")),
                ..params(1, 10)
            },
        );
        assert_eq!(names(&from_only), vec!["John Doe", "Peter Jones"]);

        let to_only = execute(
            &extended_persons(),
            &SearchParams {
                birthday_to: Some(date("1965-12-31")),
                ..params(1, 10)
            },
        );
        assert_eq!(names(&to_only), vec!["John Wick", "Sarah Connor"]);
    }

    #[test]
    fn inverted_birthday_range_matches_nothing() {
        let result = execute(
            &extended_persons(),
            &SearchParams {
                birthday_from: Some(date("2000-01-01")),
                birthday_to: Some(date("1990-01-01")),
                ..params(1, 10)
            },
        );
        assert_eq!(result.total, 0);
        assert!(result.data.is_empty());
    }

    #[test]
    fn combined_text_and_date_filters() {
        let result = execute(
            &extended_persons(),
            &SearchParams {
                query: "j".to_string(),
                birthday_from: Some(date("1980-01-01")),
                birthday_to: Some(date("1991-01-01")),
                ..params(1, 10)
            },
        );
        assert_eq!(names(&result), vec!["Jane Smith", "John Doe"]);
        assert_eq!(result.total, 2);
    }

    #[test]
    fn paginates_filtered_results() {
        let result = execute(
            &extended_persons(),
            &SearchParams {
                birthday_to: Some(date("1989-12-31")),
                ..params(2, 2)
            },
        );
        assert_eq!(names(&result), vec!["Martin McFly", "Sarah Connor"]);
        assert_eq!(result.total, 4);
    }

    #[test]
    fn page_beyond_end_is_empty_with_true_total() {
        let result = execute(&extended_persons(), &params(10, 10));
        assert!(result.data.is_empty());
        assert_eq!(result.total, 6);
        assert_eq!(result.page, 10);
        assert_eq!(result.page_size, 10);
    }

    #[test]
    fn page_below_one_behaves_as_first_page() {
        let persons = extended_persons();
        for page in [0, -1, i64::MIN] {
            let result = execute(&persons, &params(page, 3));
            assert_eq!(result, execute(&persons, &params(1, 3)));
            assert_eq!(result.page, 1);
        }
    }

    #[test]
    fn negative_page_size_behaves_as_default() {
        let persons = extended_persons();
        let result = execute(&persons, &params(1, -5));
        assert_eq!(result, execute(&persons, &params(1, DEFAULT_PAGE_SIZE)));
        assert_eq!(result.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(result.data.len(), 6);
    }

    #[test]
    fn zero_page_size_is_kept_and_returns_no_data() {
        let result = execute(&extended_persons(), &params(1, 0));
        assert!(result.data.is_empty());
        assert_eq!(result.total, 6);
        assert_eq!(result.page_size, 0);
    }

    #[test]
    fn huge_paging_values_do_not_overflow() {
        let result = execute(&extended_persons(), &params(i64::MAX, i64::MAX));
        assert!(result.data.is_empty());
        assert_eq!(result.total, 6);

        let first = execute(&extended_persons(), &params(1, i64::MAX));
        assert_eq!(first.data.len(), 6);
    }

    #[test]
    fn empty_snapshot_yields_empty_result() {
        let result = execute(&[], &params(-2, -2));
        assert!(result.data.is_empty());
        assert_eq!(result.total, 0);
        assert_eq!(result.page, 1);
        assert_eq!(result.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn ordering_is_independent_of_input_order() {
        let forward = extended_persons();
        let mut reversed = forward.clone();
        reversed.reverse();
        let mut rotated = forward.clone();
        rotated.rotate_left(2);

        let expected = execute(&forward, &params(1, 10));
        assert_eq!(execute(&reversed, &params(1, 10)), expected);
        assert_eq!(execute(&rotated, &params(1, 10)), expected);
    }

    #[test]
    fn sort_uses_byte_order() {
        let persons = vec![
            person("anna", "Zed", "1990-01-01"),
            person("Zoe", "Alpha", "1990-01-01"),
            person("Anna", "Beta", "1990-01-01"),
        ];
        let result = execute(&persons, &params(1, 10));
        assert_eq!(names(&result), vec!["Anna Beta", "Zoe Alpha", "anna Zed"]);
    }

    #[test]
    fn exact_duplicates_are_kept() {
        let persons = vec![
            person("John", "Doe", "1990-05-15"),
            person("John", "Doe", "1970-01-01"),
        ];
        let result = execute(&persons, &params(1, 10));
        assert_eq!(result.total, 2);
        assert_eq!(names(&result), vec!["John Doe", "John Doe"]);
    }

    #[test]
    fn page_length_never_exceeds_page_size() {
        let persons = extended_persons();
        for page_size in 1..=7 {
            for page in 1..=8 {
                let result = execute(&persons, &params(page, page_size));
                assert!(result.data.len() <= page_size as usize);
                assert_eq!(result.total, persons.len());
                if (page - 1) * page_size >= persons.len() as i64 {
                    assert!(result.data.is_empty());
                }
            }
        }
    }

    #[test]
    fn repeated_queries_are_identical() {
        let persons = extended_persons();
        let query = SearchParams {
            query: "o".to_string(),
            ..params(1, 4)
        };
        assert_eq!(execute(&persons, &query), execute(&persons, &query));
    }
}
