use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

enum QueryOp {
    Eq,
    Like,
    Search(Vec<String>),
    Page,
    PageSize,
}

pub fn derive_query_filter(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let struct_name = input.ident;
    let mut field_handlers = vec![];
    let mut page_field = None;
    let mut page_size_field = None;

    if let syn::Data::Struct(data) = input.data {
        for field in data.fields {
            let field_ident = match &field.ident {
                Some(ident) => ident.clone(),
                None => continue,
            };

            let mut rename = field_ident.to_string();
            let mut query_ops = Vec::new();

            // 解析所有 #[query(...)] 属性
            for attr in &field.attrs {
                if !attr.path().is_ident("query") {
                    continue;
                }

                let res = attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("eq") {
                        query_ops.push(QueryOp::Eq);
                    } else if meta.path.is_ident("like") {
                        query_ops.push(QueryOp::Like);
                    } else if meta.path.is_ident("search") {
                        let val: syn::LitStr = meta.value()?.parse()?;
                        let fields = val.value().split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
                        query_ops.push(QueryOp::Search(fields));
                    } else if meta.path.is_ident("page") {
                        query_ops.push(QueryOp::Page);
                    } else if meta.path.is_ident("page_size") {
                        query_ops.push(QueryOp::PageSize);
                    } else if meta.path.is_ident("field") {
                        let val: syn::LitStr = meta.value()?.parse()?;
                        rename = val.value();
                    } else {
                        return Err(meta.error("Unsupported #[query(...)] attribute"));
                    }
                    Ok(())
                });

                if let Err(e) = res {
                    return e.to_compile_error().into();
                }
            }

            for op in query_ops {
                let handler: TokenStream2 = match op {
                    QueryOp::Eq => quote! {
                        if let Some(val) = &self.#field_ident {
                            if let Ok(val) = mongodb::bson::to_bson(val) {
                                qb = qb.eq(#rename, val);
                            }
                        }
                    },
                    QueryOp::Like => quote! {
                        if let Some(val) = &self.#field_ident {
                            qb = qb.like(#rename, val.as_str());
                        }
                    },
                    QueryOp::Search(fields) => quote! {
                        if let Some(val) = &self.#field_ident {
                            qb = qb.any_like(&[#(#fields),*], val.as_str());
                        }
                    },
                    QueryOp::Page => {
                        page_field = Some(field_ident.clone());
                        continue;
                    }
                    QueryOp::PageSize => {
                        page_size_field = Some(field_ident.clone());
                        continue;
                    }
                };
                field_handlers.push(handler);
            }
        }
    }

    let page_info = match (page_field, page_size_field) {
        (Some(page), Some(page_size)) => quote! {
            fn page_info(&self) -> common::query_builder::PageInfo {
                common::query_builder::PageInfo::new(self.#page, self.#page_size)
            }
        },
        _ => quote! {},
    };

    let expanded = quote! {
        impl common::query_builder::QueryFilterProvider for #struct_name {
            fn to_query_builder(&self) -> common::query_builder::QueryBuilder {
                let mut qb = common::query_builder::QueryBuilder::new();
                #(#field_handlers)*
                qb
            }

            #page_info
        }
    };

    expanded.into()
}
