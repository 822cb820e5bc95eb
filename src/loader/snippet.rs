//! Snippet typed out by the intro loader.

/// Competitive-programming template shown while the site loads.
pub const TEMPLATE_SNIPPET: &str = r#"#include <bits/stdc++.h>
using namespace std;
#define ll long long
#define pb push_back
#define mp make_pair
#define endl "\n"
#define F first
#define S second
#define umap unordered_map<int, int>
#define mset multiset<pair<int, int>>
#define mst multiset<int>
#define vct vector<int>
#define pii pair<int, int>
#define ld long double
#define vpii vector<pair<int, int>>
#define lli long long int
#define F(i, n) for(int i = 0; i < (n); ++i)
#define R(i, n) for(int i = (n) - 1; i >= 0; --i)
#define IOS ios_base::sync_with_stdio(false); cin.tie(NULL); cout.tie(NULL)

void solve() {
    // SCPC 2026 - Code. Compete. Conquer.
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_shape() {
        assert!(TEMPLATE_SNIPPET.starts_with("#include <bits/stdc++.h>\n"));
        assert!(TEMPLATE_SNIPPET.ends_with('}'));
        assert!(TEMPLATE_SNIPPET.contains(r#"#define endl "\n""#));
    }
}
