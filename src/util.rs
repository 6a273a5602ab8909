/*
 * File: /src/util.rs
 * Created Date: Tuesday, June 18th 2024
 * Author: Zihan
 * -----
 * Last Modified: Sunday, 18th October 2026
 * Modified By: Zihan Wu <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-18		Zihan	Label comparison up to renaming, log timestamps
 */
use std::collections::HashMap;

use chrono::Local;

use crate::Label;

/// Wall-clock time for progress lines
pub fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// 检查两个分类结果是否等价
///
/// Two labelings are equivalent when one is a renaming of the other.
pub fn are_equivalent_classifications(a: &[Label], b: &[Label]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut a_to_b_map = HashMap::new();
    let mut b_to_a_map = HashMap::new();

    for (&a_class, &b_class) in a.iter().zip(b.iter()) {
        let a_mapped = a_to_b_map.entry(a_class).or_insert(b_class);
        let b_mapped = b_to_a_map.entry(b_class).or_insert(a_class);

        if *a_mapped != b_class || *b_mapped != a_class {
            return false;
        }
    }

    true
}

/// Number of distinct labels in use
pub fn count_distinct(labels: &[Label]) -> usize {
    let mut seen: Vec<Label> = labels.to_vec();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}
