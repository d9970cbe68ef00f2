mod build_and_search;
