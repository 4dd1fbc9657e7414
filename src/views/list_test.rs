use super::*;
use crate::net::types::Category;
use crate::state::test_helpers::community;

fn sample() -> Arc<Vec<Community>> {
    let mut dogs = community("c1", "Dog Lovers", "owner", &[]);
    dogs.description = "for dog people".into();
    dogs.category = Category::Dogs;
    let mut cats = community("c2", "Cat Club", "owner", &[]);
    cats.description = "cats only".into();
    cats.category = Category::Cats;
    Arc::new(vec![dogs, cats])
}

fn numbered(n: usize) -> Arc<Vec<Community>> {
    Arc::new(
        (1..=n)
            .map(|i| community(&format!("c{i}"), &format!("Group {i}"), "owner", &[]))
            .collect(),
    )
}

fn names(list: &[Community]) -> Vec<&str> {
    list.iter().map(|c| c.name.as_str()).collect()
}

// =============================================================
// filter_communities
// =============================================================

#[test]
fn filter_is_case_insensitive_across_fields() {
    let list = sample();
    assert_eq!(names(&filter_communities(&list, "dog")), vec!["Dog Lovers"]);
    assert_eq!(names(&filter_communities(&list, "CATS ONLY")), vec!["Cat Club"]);
}

#[test]
fn filter_matches_category_label() {
    let mut list = (*sample()).clone();
    list[1].name = "Whiskers".into();
    list[1].description = "purr".into();
    let list = Arc::new(list);
    assert_eq!(names(&filter_communities(&list, "cats")), vec!["Whiskers"]);
}

#[test]
fn filter_matches_multi_word_category() {
    let mut list = (*sample()).clone();
    list[0].category = Category::SmallAnimals;
    let list = Arc::new(list);
    assert_eq!(names(&filter_communities(&list, "small anim")), vec!["Dog Lovers"]);
}

#[test]
fn empty_query_returns_same_reference() {
    let list = sample();
    assert!(Arc::ptr_eq(&filter_communities(&list, ""), &list));
    assert!(Arc::ptr_eq(&filter_communities(&list, "   "), &list));
}

#[test]
fn filter_is_idempotent() {
    let list = sample();
    let once = filter_communities(&list, "club");
    let twice = filter_communities(&once, "club");
    assert_eq!(*once, *twice);
}

#[test]
fn filter_with_no_match_is_empty() {
    assert!(filter_communities(&sample(), "hamster").is_empty());
}

// =============================================================
// ListView memo
// =============================================================

#[test]
fn memo_reuses_result_for_same_inputs() {
    let list = sample();
    let mut view = ListView::new(10);
    view.set_query("dog");
    let first = view.filtered(&list);
    let second = view.filtered(&list);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn memo_recomputes_when_list_or_query_changes() {
    let list = sample();
    let mut view = ListView::new(10);
    view.set_query("dog");
    let first = view.filtered(&list);

    let replaced = Arc::new((*list).clone());
    let after_list_change = view.filtered(&replaced);
    assert!(!Arc::ptr_eq(&first, &after_list_change));

    view.set_query("cat");
    assert_eq!(names(&view.filtered(&replaced)), vec!["Cat Club"]);
}

#[test]
fn empty_query_view_passes_list_through() {
    let list = sample();
    let mut view = ListView::default();
    assert!(Arc::ptr_eq(&view.filtered(&list), &list));
}

// =============================================================
// ListView paging
// =============================================================

#[test]
fn pages_window_over_filtered_list() {
    let list = numbered(5);
    let mut view = ListView::new(2);

    assert_eq!(view.pagination(&list), Pagination { page: 1, page_count: 3 });
    assert_eq!(names(&view.visible(&list)), vec!["Group 1", "Group 2"]);

    view.next_page(&list);
    view.next_page(&list);
    view.next_page(&list);
    assert_eq!(view.pagination(&list), Pagination { page: 3, page_count: 3 });
    assert_eq!(names(&view.visible(&list)), vec!["Group 5"]);

    view.prev_page(&list);
    assert_eq!(names(&view.visible(&list)), vec!["Group 3", "Group 4"]);
}

#[test]
fn empty_list_has_one_page() {
    let list = Arc::new(Vec::new());
    let mut view = ListView::new(4);
    assert_eq!(view.pagination(&list), Pagination { page: 1, page_count: 1 });
    assert!(view.visible(&list).is_empty());
}

#[test]
fn changing_query_resets_to_first_page() {
    let list = numbered(6);
    let mut view = ListView::new(2);
    view.set_page(3, &list);
    assert_eq!(view.pagination(&list).page, 3);

    view.set_query("group");
    assert_eq!(view.pagination(&list).page, 1);
}

#[test]
fn page_clamps_when_list_shrinks() {
    let mut view = ListView::new(2);
    let big = numbered(6);
    view.set_page(3, &big);

    let small = numbered(3);
    assert_eq!(view.pagination(&small), Pagination { page: 2, page_count: 2 });
    assert_eq!(names(&view.visible(&small)), vec!["Group 3"]);
}

#[test]
fn zero_page_size_is_treated_as_one() {
    let list = numbered(2);
    let mut view = ListView::new(0);
    assert_eq!(view.pagination(&list).page_count, 2);
}
